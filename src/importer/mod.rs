// ==========================================
// 库存管理看板 - 导入层
// ==========================================
// 职责: CSV / Excel 批量上传，生成行级错误报告
// 支持: 商品 / 分类 / 供应商 / 销售
// ==========================================

// 模块声明
pub mod bulk_importer;
pub mod error;
pub mod file_parser;
pub mod report;
pub mod row_mapper;

// 重导出核心类型
pub use bulk_importer::{BulkImporter, ImportKind, SaleUploadTarget};
pub use error::{ImportError, ImportResult, RowError};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, UniversalFileParser};
pub use report::{UploadOutcome, UploadReport};
pub use row_mapper::{RowMapper, SKU_ALIASES};
