const TITLE: &str = "GCI - Classes & Tasks";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 56rem; margin: 0 auto; padding: 1.5rem; }
h1 { font-size: 1.5rem; margin-bottom: 1rem; }
form.inline { display: inline; }
form.fields { display: flex; gap: .5rem; flex-wrap: wrap; align-items: center; }
input, select { border: 1px solid #ccc; border-radius: 4px; padding: .5rem .75rem; }
button.primary { background: #000; color: #fff; border: 0; border-radius: 4px; padding: .5rem 1rem; }
button.link { background: none; border: 0; text-decoration: underline; cursor: pointer; }
button.danger { color: #dc2626; }
.panel { border: 1px solid #ccc; border-radius: 4px; padding: .75rem; }
ul.rows { list-style: none; padding: 0; }
ul.rows li { display: flex; justify-content: space-between; align-items: center; padding: .75rem 0; border-bottom: 1px solid #eee; }
.muted { color: #4b5563; font-size: .875rem; }
.error { color: #dc2626; }
"#;

/// Wrap a page body in the shared document shell
pub fn page(heading: &str, body: &str) -> String {
    document(heading, body, None)
}

/// Page shown while the first fetch is still running.
///
/// Refreshes to `reload_to`, which should read from the cache so the
/// pending fetch is awaited rather than restarted.
pub fn loading(heading: &str, reload_to: &str) -> String {
    document(heading, "<p>Loading...</p>", Some(reload_to))
}

fn document(heading: &str, body: &str, reload_to: Option<&str>) -> String {
    let refresh = match reload_to {
        Some(url) => format!(r#"<meta http-equiv="refresh" content="1; url={}">"#, escape(url)),
        None => String::new(),
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{heading} | {title}</title>
{refresh}
<style>{style}</style>
</head>
<body>
<h1><a href="/">{title}</a></h1>
<main>
{body}
</main>
</body>
</html>
"#,
        heading = escape(heading),
        title = escape(TITLE),
        refresh = refresh,
        style = STYLE,
        body = body,
    )
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Record id as a URL path segment, safe inside an HTML attribute
pub fn id_segment(id: &str) -> String {
    escape(&urlencoding::encode(id))
}

/// `<p class="error">` banner for a mutation that failed on the last action
pub fn notice(message: Option<&str>) -> String {
    match message {
        Some(m) => format!(r#"<p class="error">Last action failed: {}</p>"#, escape(m)),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<b>"Tom" & 'Jerry'</b>"#), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_id_segment_encodes_slash() {
        assert_eq!(id_segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_loading_page_refreshes() {
        let html = loading("Tasks", "/tasks?cached=true");
        assert!(html.contains("Loading..."));
        assert!(html.contains(r#"content="1; url=/tasks?cached=true""#));
        assert!(!page("Tasks", "").contains("http-equiv"));
    }
}
