//! # 路径规范化模块
//!
//! 资源的逻辑路径统一使用 `/` 分隔、相对于资源根目录，
//! 由具体的 [`ResourceSource`](super::ResourceSource) 决定如何映射到实际位置。

/// 规范化逻辑路径
///
/// - 统一使用 `/` 分隔符
/// - 移除空组件与 `.`
/// - `..` 向上一级，但不会越过根目录
///
/// # 示例
///
/// ```ignore
/// assert_eq!(normalize_logical_path("Custom Objects\\..\\Tilesets/./Tileset3.png"), "Tilesets/Tileset3.png");
/// ```
pub fn normalize_logical_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");

    let mut components = Vec::new();
    for component in normalized.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }

    components.join("/")
}

/// 清理文件名：移除不适合作为文件名的字符
///
/// 清理后为空时返回 `fallback`。
pub fn sanitize_file_name(name: &str, fallback: &str) -> String {
    let sanitized = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>();

    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// 输出图片文件名：`<世界名>_<时间戳>.png`
pub fn output_file_name(root_name: &str, timestamp: &str) -> String {
    format!("{}_{}.png", sanitize_file_name(root_name, "world"), timestamp)
}
