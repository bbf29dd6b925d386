use crate::wire::GeneratedSite;

/// Inlines the css/js "files" into the HTML so the result previews on its
/// own. Styles go before `</head>`, scripts before `</body>`; without those
/// tags they are prepended/appended instead.
pub fn combine_for_preview(site: &GeneratedSite) -> String {
    let css = site.css.trim();
    let js = site.js.trim();
    if css.is_empty() && js.is_empty() {
        return site.html.clone();
    }

    let mut html = site.html.clone();

    if !css.is_empty() {
        let style = format!("<style>\n{css}\n</style>");
        html = match html.find("</head>") {
            Some(i) => format!("{}  {}\n{}", &html[..i], style, &html[i..]),
            None => format!("{style}\n{html}"),
        };
    }

    if !js.is_empty() {
        let script = format!("<script>\n{js}\n</script>");
        html = match html.rfind("</body>") {
            Some(i) => format!("{}  {}\n{}", &html[..i], script, &html[i..]),
            None => format!("{html}\n{script}"),
        };
    }

    html
}

/// True when the HTML already pulls in the external files by name.
pub fn links_external_files(html: &str) -> bool {
    html.contains("styles.css") || html.contains("script.js")
}
