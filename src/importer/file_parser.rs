// ==========================================
// 库存管理看板 - 文件解析器实现
// ==========================================
// 支持: CSV (.csv, UTF-8, 必须有表头) / Excel (.xlsx, 第一个工作表)
// 行号口径: 表头为第 1 行，数据行从第 2 行开始
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ==========================================
// RawRow - 解析后的原始行
// ==========================================
/// 单元格已去首尾空白；空单元格不出现在 cells 中
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub row_number: usize,
    pub cells: HashMap<String, String>,
}

impl RawRow {
    /// 读取单元格（缺失或空白 → None）
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// 按别名顺序读取第一个非空单元格
    pub fn get_any(&self, columns: &[&str]) -> Option<&str> {
        columns.iter().find_map(|c| self.get(c))
    }

    fn from_cells<I>(row_number: usize, headers: &[String], values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut cells = HashMap::new();
        for (col_idx, value) in values.into_iter().enumerate() {
            let Some(header) = headers.get(col_idx) else {
                continue;
            };
            if header.is_empty() {
                continue;
            }
            let value = value.trim();
            if !value.is_empty() {
                cells.insert(header.clone(), value.to_string());
            }
        }
        Self { row_number, cells }
    }
}

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser {
    /// 解析文件为原始行（跳过全空行）
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 从任意 Reader 解析（上传内容直接以字节流传入）
    pub fn parse_reader<R: Read>(&self, reader: R) -> ImportResult<Vec<RawRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::MissingHeader);
        }

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let row = RawRow::from_cells(
                idx + 2,
                &headers,
                record.iter().map(str::to_string),
            );

            // 跳过完全空白的行
            if row.cells.is_empty() {
                continue;
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

impl FileParser for CsvParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        self.parse_reader(file)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook: Xlsx<_> = open_workbook(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut sheet_rows = range.rows();
        let header_row = sheet_rows.next().ok_or(ImportError::MissingHeader)?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::MissingHeader);
        }

        let mut rows = Vec::new();
        for (idx, data_row) in sheet_rows.enumerate() {
            let row = RawRow::from_cells(
                idx + 2,
                &headers,
                data_row.iter().map(|cell| cell.to_string()),
            );
            if row.cells.is_empty() {
                continue;
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<RawRow>> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_rows(path),
            "xlsx" => ExcelParser.parse_rows(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut f = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(f, "{}", content).unwrap();
        f
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let f = csv_file("sku,quantity,date\nA-1, 3 ,2024-01-15\nB-2,2,\n");

        let rows = CsvParser.parse_rows(f.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].get("quantity"), Some("3"));
        assert_eq!(rows[1].get("date"), None);
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_rows(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows_keeps_numbering() {
        let f = csv_file("name,description\nTools,hand tools\n,\nGarden,\n");

        let rows = CsvParser.parse_rows(f.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row_number, 4);
        assert_eq!(rows[1].get("name"), Some("Garden"));
    }

    #[test]
    fn test_get_any_uses_alias_order() {
        let rows = CsvParser
            .parse_reader("SKU,product_sku,quantity\n,P-9,1\n".as_bytes())
            .unwrap();
        assert_eq!(rows[0].get_any(&["sku", "SKU", "product_sku"]), Some("P-9"));
    }

    #[test]
    fn test_universal_parser_rejects_other_extensions() {
        let f = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser.parse(f.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[test]
    fn test_invalid_utf8_is_file_error() {
        let bytes: &[u8] = b"name\n\xff\xfe\n";
        let result = CsvParser.parse_reader(bytes);
        assert!(result.is_err());
    }
}
