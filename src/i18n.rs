// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 已提供翻译的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "zh-CN"];

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 规范化语言代码，未提供翻译时回退 en
pub fn resolve_locale(locale: &str) -> &'static str {
    let wanted = locale.trim();
    SUPPORTED_LOCALES
        .iter()
        .find(|l| l.eq_ignore_ascii_case(wanted))
        .copied()
        .or_else(|| {
            // zh / zh-Hans / zh_CN 均视为 zh-CN
            wanted
                .to_lowercase()
                .starts_with("zh")
                .then_some("zh-CN")
        })
        .unwrap_or("en")
}

/// 翻译消息（无参数，使用当前语言）
///
/// # 示例
/// ```no_run
/// use inventory_dashboard::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数，使用当前语言）
///
/// # 示例
/// ```no_run
/// use inventory_dashboard::i18n::t_with_args;
/// let msg = t_with_args("import.file_not_found", &[("path", "/tmp/test.csv")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    fill_args(rust_i18n::t!(key).to_string(), args)
}

/// 按指定语言翻译（不修改全局语言）
///
/// # 示例
/// ```no_run
/// use inventory_dashboard::i18n::t_in;
/// let msg = t_in("zh-CN", "import.sku_not_found", &[("sku", "A-1")]);
/// ```
pub fn t_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    let locale = resolve_locale(locale);
    fill_args(rust_i18n::t!(key, locale = locale).to_string(), args)
}

fn fill_args(mut result: String, args: &[(&str, &str)]) -> String {
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_locale() {
        assert_eq!(resolve_locale("en"), "en");
        assert_eq!(resolve_locale("ZH-cn"), "zh-CN");
        assert_eq!(resolve_locale("zh_CN"), "zh-CN");
        assert_eq!(resolve_locale("fr"), "en");
        assert_eq!(resolve_locale(""), "en");
    }

    #[test]
    fn test_translate_explicit_locale() {
        assert_eq!(t_in("en", "common.success", &[]), "Operation successful");
        assert_eq!(t_in("zh-CN", "common.success", &[]), "操作成功");
    }

    #[test]
    fn test_translate_with_args_explicit_locale() {
        let en = t_in("en", "import.file_not_found", &[("path", "/tmp/test.csv")]);
        assert!(en.contains("/tmp/test.csv"));
        assert!(en.contains("File not found"));

        let zh = t_in("zh-CN", "import.file_not_found", &[("path", "/tmp/test.csv")]);
        assert!(zh.contains("/tmp/test.csv"));
        assert!(zh.contains("文件不存在"));
    }

    #[test]
    fn test_unknown_locale_uses_english() {
        assert_eq!(t_in("de", "common.success", &[]), "Operation successful");
    }
}
