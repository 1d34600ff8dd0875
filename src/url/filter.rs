use url::Url;

/// Path suffixes that never lead to an HTML document
///
/// Covers styles and scripts, images, fonts, office documents and data
/// formats, archives, media, executables and disk images, build artefacts,
/// and server-side script pages that rarely render as plain documentation.
pub const NON_HTML_EXTENSIONS: &[&str] = &[
    // Styles & scripts
    ".css", ".js", ".mjs", ".json", ".ts", ".jsx", ".tsx",
    // Images
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".bmp", ".tiff",
    // Fonts
    ".woff", ".woff2", ".ttf", ".eot", ".otf",
    // Documents & data
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".xml", ".rss", ".atom", ".csv",
    ".txt", ".rtf", ".md", ".yaml", ".yml", ".ini", ".cfg", ".log",
    // Archives
    ".zip", ".tar", ".gz", ".rar", ".7z",
    // Media
    ".mp4", ".mp3", ".avi", ".mov", ".wmv", ".flv", ".m4a", ".ogg", ".wav",
    // Executables & system images
    ".exe", ".dmg", ".apk", ".bin", ".iso", ".img",
    // Other
    ".map", ".webmanifest", ".appcache", ".webarchive", ".bak", ".sql", ".db", ".sqlite",
    // Server-side pages
    ".php", ".asp", ".aspx", ".jsp", ".cgi",
];

/// Returns the denied extension the URL path ends with, if any
///
/// Matching is case-insensitive and only looks at the path, so query strings
/// such as `?format=.png` do not trigger it.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_harvest::url::denied_extension;
///
/// let url = Url::parse("https://example.com/assets/Logo.PNG").unwrap();
/// assert_eq!(denied_extension(&url), Some(".png"));
///
/// let url = Url::parse("https://example.com/guide/").unwrap();
/// assert_eq!(denied_extension(&url), None);
/// ```
pub fn denied_extension(url: &Url) -> Option<&'static str> {
    let path = url.path().to_ascii_lowercase();
    NON_HTML_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| path.ends_with(ext))
}

/// Checks whether two URLs live on the same host
///
/// Host and explicit port must both match. The scheme is ignored, so an
/// `http` link back to an `https` root stays on-host.
pub fn is_same_host(url: &Url, root: &Url) -> bool {
    url.host_str() == root.host_str() && url.port() == root.port()
}
