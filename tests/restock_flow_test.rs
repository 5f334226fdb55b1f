// ==========================================
// 补货流程集成测试
// ==========================================
// 覆盖: 建议排序 → 下单（批量 / 单笔）→ 分组 → 完成入库 → 汇总

use std::collections::HashMap;

use inventory_dashboard::api::ApiError;
use inventory_dashboard::config::config_keys;
use inventory_dashboard::domain::{NewPurchaseOrder, PurchaseOrderUpdate};
use inventory_dashboard::repository::NewSale;
use inventory_dashboard::{MovementType, PurchaseOrderStatus, ReorderPriority};

mod test_helpers;
use test_helpers::{add_product, add_supplier, create_test_state};

fn completed() -> PurchaseOrderUpdate {
    PurchaseOrderUpdate {
        status: Some(PurchaseOrderStatus::Completed),
        ..Default::default()
    }
}

#[test]
fn test_suggestions_ranked_critical_first() {
    let (_db, state) = create_test_state();
    let acme = add_supplier(&state, "Acme");
    let low = add_product(&state, "Low", "L", 1.0, 11, 10, None, Some(acme));
    let empty = add_product(&state, "Empty", "E", 1.0, 0, 10, None, None);
    let under = add_product(&state, "Under", "U", 1.0, 5, 10, None, Some(acme));
    add_product(&state, "Plenty", "P", 1.0, 100, 10, None, None);

    state
        .config
        .set_global_config_value(config_keys::REORDER_LEAD_TIME_DAYS, "3")
        .unwrap();

    let report = state.restock_api.suggestions().unwrap();
    let ids: Vec<i64> = report.suggestions.iter().map(|s| s.product_id).collect();
    assert_eq!(ids, vec![empty, under, low]);
    assert_eq!(report.out_count, 2);
    assert_eq!(report.low_count, 1);

    let first = &report.suggestions[0];
    assert_eq!(first.priority, ReorderPriority::Critical);
    assert_eq!(first.suggested_quantity, 30);
    assert_eq!(first.supplier, "No Supplier");
    assert_eq!(first.lead_time, 3);

    let last = &report.suggestions[2];
    assert_eq!(last.priority, ReorderPriority::High);
    assert_eq!(last.suggested_quantity, 20);
    assert_eq!(last.supplier, "Acme");
}

#[test]
fn test_batch_order_shares_group_and_restocks_once() {
    let (_db, state) = create_test_state();
    let acme = add_supplier(&state, "Acme");
    let a = add_product(&state, "A", "A", 2.0, 0, 10, None, Some(acme));
    let b = add_product(&state, "B", "B", 3.0, 5, 10, None, Some(acme));

    let mut quantities = HashMap::new();
    quantities.insert(b.to_string(), 0);

    let created = state
        .restock_api
        .create_orders_from_suggestions(&[a.to_string(), b.to_string()], &quantities, true)
        .unwrap();
    assert_eq!(created.len(), 2);
    let group_id = created[0].group_id.clone().expect("批量下单应有 group_id");
    assert!(created.iter().all(|o| o.group_id.as_deref() == Some(group_id.as_str())));
    assert_eq!(created[0].quantity_ordered, 30);
    // 覆盖数量下限为 1
    assert_eq!(created[1].quantity_ordered, 1);

    let groups = state.restock_api.grouped_orders(None).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].total_quantity, 31);
    assert!((groups[0].total_value - 63.0).abs() < 1e-9);
    assert!(groups[0].is_grouped);

    state.restock_api.update_group(&group_id, &completed()).unwrap();
    assert_eq!(state.stock_api.get_product(a).unwrap().product.quantity, 30);
    assert_eq!(state.stock_api.get_product(b).unwrap().product.quantity, 6);

    // 再次标记完成不重复入库
    state.restock_api.update_group(&group_id, &completed()).unwrap();
    assert_eq!(state.stock_api.get_product(a).unwrap().product.quantity, 30);

    let movements = state.stock_api.product_movements(a).unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::Restock);
    assert_eq!(movements[0].reference_type.as_deref(), Some("purchase_order"));
}

#[test]
fn test_single_selection_creates_individual_order() {
    let (_db, state) = create_test_state();
    let a = add_product(&state, "A", "A", 2.0, 0, 10, None, None);

    let created = state
        .restock_api
        .create_orders_from_suggestions(&[a.to_string()], &HashMap::new(), false)
        .unwrap();
    assert_eq!(created.len(), 1);
    assert!(created[0].group_id.is_none());

    let key = format!("individual-{}", created[0].id);
    let groups = state.restock_api.grouped_orders(None).unwrap();
    assert_eq!(groups[0].key, key);
    assert!(!groups[0].is_grouped);

    state.restock_api.update_group(&key, &completed()).unwrap();
    assert_eq!(state.stock_api.get_product(a).unwrap().product.quantity, 30);
}

#[test]
fn test_unknown_selection_is_rejected() {
    let (_db, state) = create_test_state();
    add_product(&state, "A", "A", 2.0, 0, 10, None, None);

    let err = state
        .restock_api
        .create_orders_from_suggestions(&["999".to_string()], &HashMap::new(), false)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = state
        .restock_api
        .create_orders_from_suggestions(&[], &HashMap::new(), false)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert!(state.restock_api.list_orders(None).unwrap().is_empty());
}

#[test]
fn test_batch_is_atomic() {
    let (_db, state) = create_test_state();
    let a = add_product(&state, "A", "A", 2.0, 0, 10, None, None);

    let order = |product_id: i64| NewPurchaseOrder {
        product_id,
        supplier_id: None,
        quantity_ordered: 5,
        status: PurchaseOrderStatus::Pending,
        notes: None,
        notify_by_email: false,
    };

    let err = state
        .restock_api
        .create_batch(&[order(a), order(a + 100)])
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert!(state.restock_api.list_orders(None).unwrap().is_empty());
}

#[test]
fn test_order_lifecycle_and_summary() {
    let (_db, state) = create_test_state();
    let a = add_product(&state, "A", "A", 2.0, 0, 10, None, None);
    let b = add_product(&state, "B", "B", 4.0, 11, 10, None, None);
    add_product(&state, "C", "C", 4.0, 50, 10, None, None);

    let make = |product_id: i64, qty: i64| NewPurchaseOrder {
        product_id,
        supplier_id: None,
        quantity_ordered: qty,
        status: PurchaseOrderStatus::Pending,
        notes: None,
        notify_by_email: false,
    };
    let first = state.restock_api.create_order(&make(a, 10)).unwrap();
    let second = state.restock_api.create_order(&make(b, 5)).unwrap();

    let summary = state.restock_api.summary().unwrap();
    assert_eq!(summary.pending_orders, 2);
    assert_eq!(summary.out_of_stock_items, 1);
    assert_eq!(summary.low_stock_items, 1);
    assert!((summary.total_pending_value - 40.0).abs() < 1e-9);

    let cancelled = state
        .restock_api
        .update_order(
            second.id,
            &PurchaseOrderUpdate {
                status: Some(PurchaseOrderStatus::Cancelled),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(cancelled.status, PurchaseOrderStatus::Cancelled);
    assert_eq!(
        state
            .restock_api
            .list_orders(Some(PurchaseOrderStatus::Pending))
            .unwrap()
            .len(),
        1
    );

    let zero = PurchaseOrderUpdate {
        quantity_ordered: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        state.restock_api.update_order(first.id, &zero),
        Err(ApiError::InvalidInput(_))
    ));

    state.restock_api.delete_order(first.id).unwrap();
    assert!(matches!(
        state.restock_api.get_order(first.id),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_record_sale_checks_stock() {
    let (_db, state) = create_test_state();
    let a = add_product(&state, "A", "A", 2.5, 3, 0, None, None);

    let sale = state
        .restock_api
        .record_sale(&NewSale {
            product_id: a,
            quantity: 2,
            sale_date: None,
            notes: None,
        })
        .unwrap();
    assert_eq!(sale.sale_price, Some(2.5));
    assert_eq!(state.stock_api.get_product(a).unwrap().product.quantity, 1);

    let err = state
        .restock_api
        .record_sale(&NewSale {
            product_id: a,
            quantity: 2,
            sale_date: None,
            notes: None,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::InsufficientStock {
            available: 1,
            requested: 2,
            ..
        }
    ));
}

#[test]
fn test_corrupt_order_row_is_reported() {
    let (_db, state) = create_test_state();
    let a = add_product(&state, "A", "A", 2.0, 0, 10, None, None);
    let order = state
        .restock_api
        .create_order(&NewPurchaseOrder {
            product_id: a,
            supplier_id: None,
            quantity_ordered: 5,
            status: PurchaseOrderStatus::Pending,
            notes: None,
            notify_by_email: false,
        })
        .unwrap();

    let conn = rusqlite::Connection::open(&state.db_path).unwrap();
    conn.execute(
        "UPDATE purchase_orders SET status = 'shipped' WHERE id = ?1",
        [order.id],
    )
    .unwrap();
    let err = state.restock_api.get_order(order.id).unwrap_err();
    assert!(matches!(err, ApiError::DatabaseError(_)));
    assert!(state.restock_api.list_orders(None).is_err());

    conn.execute(
        "UPDATE purchase_orders SET status = 'pending', order_date = 'yesterday' WHERE id = ?1",
        [order.id],
    )
    .unwrap();
    let err = state.restock_api.get_order(order.id).unwrap_err();
    assert!(matches!(err, ApiError::DatabaseError(_)));
}
