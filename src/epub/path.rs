//! EPUB内部路径处理
//!
//! 清单与目录中的href都是相对于所在文件的URL引用，这里把它们统一成
//! 相对于压缩包根目录、已解码的路径，便于按路径匹配条目。

use percent_encoding::percent_decode_str;

/// 路径所在目录（不含结尾的 `/`），根目录返回空字符串
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// 路径中的文件名部分
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// 文件名去掉扩展名
pub fn file_stem(path: &str) -> &str {
    let name = basename(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(pos) => &name[..pos],
    }
}

/// 合并并折叠 `.`、`..` 段
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// 把相对于 `base_file` 的href解析为压缩包内的完整路径，保留 `#片段`
///
/// 带有URL协议的外部链接原样返回。
pub fn resolve_href(base_file: &str, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() || is_external(href) {
        return href.to_string();
    }
    let (path, fragment) = match href.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (href, None),
    };
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let base_dir = dirname(base_file);
    let joined = if path.is_empty() {
        base_file.to_string()
    } else if base_dir.is_empty() || decoded.starts_with('/') {
        decoded.to_string()
    } else {
        format!("{}/{}", base_dir, decoded)
    };
    let mut resolved = normalize(&joined);
    if let Some(fragment) = fragment {
        resolved.push('#');
        resolved.push_str(fragment);
    }
    resolved
}

pub(crate) fn is_external(href: &str) -> bool {
    href.contains("://") || href.starts_with("mailto:") || href.starts_with("data:")
}
