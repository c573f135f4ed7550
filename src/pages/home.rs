use super::layout;

pub fn render() -> String {
    let body = r#"<p class="muted">Choose a menu:</p>
<ul>
<li><a href="/classes">Classes</a></li>
<li><a href="/tasks">Tasks</a></li>
</ul>"#;
    layout::page("Home", body)
}
