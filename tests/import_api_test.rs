// ==========================================
// 批量上传 API 集成测试
// ==========================================
// 覆盖: 商品 / 分类 / 供应商 / 销售上传，部分成功，文件级失败，本地化行错误

use inventory_dashboard::config::config_keys;
use inventory_dashboard::importer::UploadOutcome;
use inventory_dashboard::MovementType;

mod test_helpers;
use test_helpers::{add_product, create_test_state, write_csv};

#[test]
fn test_upload_categories_and_suppliers() {
    let (_db, state) = create_test_state();

    let categories = write_csv("name,description\nTools,Hand tools\n,missing name\nTools,dup\n");
    let outcome = state.import_api.upload_categories(categories.path()).unwrap();
    let report = match &outcome {
        UploadOutcome::PartialSuccess(r) => r,
        other => panic!("应为部分成功: {:?}", other),
    };
    assert_eq!(report.created_count, 1);
    assert_eq!(report.total_rows_processed, 3);
    assert_eq!(
        report.errors,
        vec![
            "Row 3: Missing 'name' column".to_string(),
            "Row 4: Category 'Tools' already exists".to_string(),
        ]
    );

    let suppliers = write_csv("name,email,phone\nAcme,a@acme.example,555-0100\n");
    let outcome = state.import_api.upload_suppliers(suppliers.path()).unwrap();
    assert!(outcome.is_success());
    let listed = state.stock_api.list_suppliers().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].phone.as_deref(), Some("555-0100"));
}

#[test]
fn test_upload_products_resolves_names() {
    let (_db, state) = create_test_state();
    test_helpers::add_category(&state, "Tools");
    test_helpers::add_supplier(&state, "Acme");

    let csv = write_csv(
        "name,sku,price,quantity,low_stock_threshold,category,supplier\n\
         Hammer,H-1,12.5,40,10,tools,Acme\n\
         Saw,S-1,abc,5,1,Tools,\n\
         Drill,D-1,80,3,2,Garden,\n\
         ,,,,,,\n\
         Level,L-1,9,7,2,,\n",
    );
    let outcome = state.import_api.upload_products(csv.path()).unwrap();
    let report = outcome.report().expect("应有报告").clone();

    assert!(matches!(outcome, UploadOutcome::PartialSuccess(_)));
    assert_eq!(report.created_count, 2);
    assert_eq!(
        report.errors,
        vec![
            "Row 3: Invalid price 'abc' - must be a number".to_string(),
            "Row 4: Category 'Garden' not found".to_string(),
        ]
    );

    let products = state.stock_api.list_products(None).unwrap();
    let hammer = products
        .iter()
        .find(|v| v.product.sku.as_deref() == Some("H-1"))
        .expect("Hammer 应已导入");
    assert!(hammer.product.category_id.is_some());
    assert!(hammer.product.supplier_id.is_some());
    assert_eq!(hammer.product.low_stock_threshold, Some(10));
}

#[test]
fn test_upload_sales_records_movements_and_checks_stock() {
    let (_db, state) = create_test_state();
    let widget = add_product(&state, "Widget", "W-1", 10.0, 5, 0, None, None);
    let gadget = add_product(&state, "Gadget", "G-1", 4.0, 100, 0, None, None);

    let csv = write_csv(
        "sku,quantity,date\n\
         W-1,3,2024-01-15\n\
         W-1,3,2024-01-16\n\
         ,2,2024-01-17\n\
         NOPE,1,2024-01-18\n\
         W-1,0,2024-01-19\n",
    );
    let outcome = state
        .import_api
        .upload_sales(csv.path(), Some(gadget), None)
        .unwrap();
    let report = outcome.report().expect("应有报告");

    assert_eq!(report.created_count, 2);
    assert_eq!(report.total_rows_processed, 5);
    assert_eq!(
        report.errors,
        vec![
            "Row 3: Insufficient stock (available: 2, requested: 3)".to_string(),
            "Row 5: Product with SKU 'NOPE' not found".to_string(),
            "Row 6: Quantity must be positive, got 0".to_string(),
        ]
    );

    assert_eq!(state.stock_api.get_product(widget).unwrap().product.quantity, 2);
    assert_eq!(state.stock_api.get_product(gadget).unwrap().product.quantity, 98);

    let movements = state.stock_api.product_movements(widget).unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::Sale);
    assert_eq!(movements[0].quantity_after, 2);

    let sales = state.stock_api.product_sales(widget).unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].sale_price, Some(10.0));
}

#[test]
fn test_upload_sales_without_any_product_reference() {
    let (_db, state) = create_test_state();
    let csv = write_csv("quantity\n1\n");

    let outcome = state.import_api.upload_sales(csv.path(), None, None).unwrap();
    let report = outcome.report().expect("应有报告");
    assert_eq!(report.created_count, 0);
    assert_eq!(
        report.errors,
        vec!["Row 2: No SKU in CSV and no product_id/sku provided in upload request".to_string()]
    );
    assert!(matches!(outcome, UploadOutcome::PartialSuccess(_)));
}

#[test]
fn test_upload_rejects_unsupported_file() {
    let (_db, state) = create_test_state();
    let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();

    let outcome = state.import_api.upload_products(file.path()).unwrap();
    assert!(matches!(outcome, UploadOutcome::Failure { .. }));
    assert!(outcome.report().is_none());
}

#[test]
fn test_row_errors_follow_configured_locale() {
    let (_db, state) = create_test_state();
    state
        .config
        .set_global_config_value(config_keys::UI_LOCALE, "zh-CN")
        .unwrap();

    let csv = write_csv("name,category\nHammer,Unknown\n");
    let outcome = state.import_api.upload_products(csv.path()).unwrap();
    let report = outcome.report().expect("应有报告");
    assert_eq!(report.errors, vec!["第 2 行: 未找到分类 'Unknown'".to_string()]);
}
