use super::layout::{self, escape, id_segment};
use super::{EditState, Records};
use crate::api::ApiError;
use crate::cache::{keys, QueryState, ReadMode};
use crate::forms::{ClassFields, ClassForm, Submission};
use crate::models::{Class, DeleteResponse};
use std::sync::{Mutex, MutexGuard};

const HEADING: &str = "Classes";

/// Page URL that renders from the cache instead of refetching
pub const CACHED_VIEW: &str = "/classes?cached=true";

#[derive(Debug, Default)]
struct PageState {
    edit: EditState<Class, ClassForm>,
    create_form: ClassForm,
    notice: Option<String>,
}

/// State of the classes page between requests.
///
/// The state is only locked between awaits, so a slow API call never
/// holds up another render of the same page.
#[derive(Debug, Default)]
pub struct ClassesPage {
    state: Mutex<PageState>,
}

impl ClassesPage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap()
    }

    #[cfg(test)]
    fn editing(&self) -> Option<Class> {
        self.state().edit.record().cloned()
    }

    /// Start editing the class with `id` from the cached list.
    /// Returns false if the list no longer holds it.
    pub fn begin_edit(&self, records: &Records, id: &str) -> bool {
        let Some(class) = records.cached_classes().into_iter().find(|c| c.id == id) else {
            tracing::debug!("Class {} not in cached list, not editing", id);
            return false;
        };
        let form = ClassForm::new(Some(&class.payload()));
        self.state().edit = EditState::Editing { record: class, form };
        true
    }

    pub fn cancel_edit(&self) {
        self.state().edit = EditState::Idle;
    }

    pub async fn create(&self, records: &Records, fields: ClassFields) -> Result<Submission<Class>, ApiError> {
        let mut form = self.state().create_form.clone();
        form.apply(fields);
        let client = &records.client;
        let outcome = form
            .submit(|payload| async move { client.create_class(&payload).await })
            .await;
        self.state().create_form = form;

        if matches!(outcome, Ok(Submission::Submitted(_))) {
            records.cache.invalidate(keys::CLASSES);
        }
        outcome
    }

    /// Submit the edit form for `id`. Nothing is sent unless that class is
    /// the one being edited.
    pub async fn update(&self, records: &Records, id: &str, fields: ClassFields) -> Result<Submission<Class>, ApiError> {
        let mut form = match &self.state().edit {
            EditState::Editing { record, form } if record.id == id => form.clone(),
            _ => {
                tracing::warn!("Update for class {} which is not being edited", id);
                return Ok(Submission::Rejected);
            }
        };
        form.apply(fields);
        let client = &records.client;
        let outcome = form
            .submit(|payload| async move { client.update_class(id, &payload).await })
            .await;
        let submitted = matches!(outcome, Ok(Submission::Submitted(_)));

        {
            // Cancel or another Edit may have landed while the request was out
            let mut state = self.state();
            if state.edit.record().is_some_and(|c| c.id == id) {
                if submitted {
                    state.edit = EditState::Idle;
                } else if let EditState::Editing { form: current, .. } = &mut state.edit {
                    *current = form;
                }
            }
        }

        if submitted {
            records.cache.invalidate(keys::CLASSES);
        }
        outcome
    }

    pub async fn delete(&self, records: &Records, id: &str) -> Result<DeleteResponse, ApiError> {
        let response = records.client.delete_class(id).await?;
        records.cache.invalidate(keys::CLASSES);
        Ok(response)
    }

    /// Remember a failed action so the next render can show it
    pub fn report(&self, err: &ApiError) {
        self.state().notice = Some(err.to_string());
    }

    pub async fn render(&self, records: &Records, mode: ReadMode) -> String {
        let classes = records.classes(mode).await;
        let mut state = self.state();
        let notice = state.notice.take();
        state.view(&classes, notice.as_deref())
    }
}

impl PageState {
    fn view(&self, classes: &QueryState<Vec<Class>>, notice: Option<&str>) -> String {
        if classes.is_loading {
            return layout::loading(HEADING, CACHED_VIEW);
        }
        if let Some(error) = &classes.error {
            return layout::page(HEADING, &format!(r#"<p class="error">Error: {}</p>"#, escape(error)));
        }

        let mut body = format!("<h2>{}</h2>\n", HEADING);
        body.push_str(&layout::notice(notice));

        match &self.edit {
            EditState::Idle => body.push_str(&form_html(&self.create_form, "/classes", "Create")),
            EditState::Editing { record, form } => {
                body.push_str(r#"<div class="panel"><p><strong>Edit Class</strong></p>"#);
                body.push_str(&form_html(
                    form,
                    &format!("/classes/{}/update", id_segment(&record.id)),
                    "Update",
                ));
                body.push_str(
                    r#"<form class="inline" method="post" action="/classes/cancel"><button class="link" type="submit">Cancel</button></form></div>"#,
                );
            }
        }

        body.push_str("\n<ul class=\"rows\">\n");
        for class in classes.data.iter().flat_map(|list| list.iter()) {
            body.push_str(&row_html(class));
        }
        body.push_str("</ul>");

        layout::page(HEADING, &body)
    }
}

fn form_html(form: &ClassForm, action: &str, label: &str) -> String {
    format!(
        r#"<form class="fields" method="post" action="{action}">
<input name="class_name" placeholder="Class name" value="{class_name}">
<input name="teacher" placeholder="Teacher" value="{teacher}">
<button class="primary" type="submit">{label}</button>
</form>
"#,
        action = action,
        class_name = escape(&form.class_name),
        teacher = escape(&form.teacher),
        label = label,
    )
}

fn row_html(class: &Class) -> String {
    let id = id_segment(&class.id);
    format!(
        r#"<li data-id="{data_id}">
<div><div><strong>{name}</strong></div><div class="muted">{teacher}</div></div>
<div>
<form class="inline" method="post" action="/classes/{id}/edit"><button class="link" type="submit">Edit</button></form>
<form class="inline" method="post" action="/classes/{id}/delete"><button class="link danger" type="submit">Delete</button></form>
</div>
</li>
"#,
        data_id = escape(&class.id),
        name = escape(&class.class_name),
        teacher = escape(&class.teacher),
        id = id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::testing::Harness;

    fn fields(class_name: &str, teacher: &str) -> ClassFields {
        ClassFields {
            class_name: class_name.to_string(),
            teacher: teacher.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_posts_once_and_refetches() {
        let h = Harness::start().await;
        let page = ClassesPage::new();
        page.render(&h.records, ReadMode::Refetch).await;

        let outcome = page
            .create(&h.records, fields(" Math ", "Ms. Lee "))
            .await
            .unwrap();
        assert!(outcome.is_submitted());
        assert_eq!(h.log.matching("POST /classes"), 1);
        assert_eq!(h.store.list_classes()[0].class_name, "Math");
        assert_eq!(page.state().create_form, ClassForm::default());

        let html = page.render(&h.records, ReadMode::Cached).await;
        assert!(html.contains("<strong>Math</strong>"));
        assert_eq!(h.log.matching("GET /classes"), 2);
    }

    #[tokio::test]
    async fn test_blank_class_name_sends_nothing() {
        let h = Harness::start().await;
        let page = ClassesPage::new();

        let outcome = page.create(&h.records, fields("  ", "Ms. Lee")).await.unwrap();
        assert_eq!(outcome, Submission::Rejected);
        assert_eq!(h.log.count(), 0);

        let html = page.render(&h.records, ReadMode::Refetch).await;
        assert!(html.contains(r#"value="Ms. Lee""#));
    }

    #[tokio::test]
    async fn test_deleted_class_disappears_after_refetch() {
        let h = Harness::start().await;
        let math = h.add_class("Math");
        let art = h.add_class("Art");
        let page = ClassesPage::new();

        let html = page.render(&h.records, ReadMode::Refetch).await;
        assert!(html.contains(&format!(r#"data-id="{}""#, math.id)));

        page.delete(&h.records, &math.id).await.unwrap();
        let html = page.render(&h.records, ReadMode::Cached).await;
        assert!(!html.contains(&format!(r#"data-id="{}""#, math.id)));
        assert!(html.contains(&format!(r#"data-id="{}""#, art.id)));
    }

    #[tokio::test]
    async fn test_reload_shows_classes_added_elsewhere() {
        let h = Harness::start().await;
        let page = ClassesPage::new();
        page.render(&h.records, ReadMode::Refetch).await;

        h.add_class("Chemistry");
        let html = page.render(&h.records, ReadMode::Cached).await;
        assert!(!html.contains("<strong>Chemistry</strong>"));

        let html = page.render(&h.records, ReadMode::Refetch).await;
        assert!(html.contains("<strong>Chemistry</strong>"));
        assert_eq!(h.log.matching("GET /classes"), 2);
    }

    #[tokio::test]
    async fn test_edit_then_cancel_makes_no_requests() {
        let h = Harness::start().await;
        let math = h.add_class("Math");
        let page = ClassesPage::new();
        page.render(&h.records, ReadMode::Refetch).await;
        let before = h.log.count();

        assert!(page.begin_edit(&h.records, &math.id));
        assert_eq!(page.editing(), Some(math.clone()));
        let html = page.render(&h.records, ReadMode::Cached).await;
        assert!(html.contains("Edit Class"));
        assert!(html.contains(r#"value="Math""#));

        page.cancel_edit();
        assert!(page.editing().is_none());
        let html = page.render(&h.records, ReadMode::Cached).await;
        assert!(!html.contains("Edit Class"));
        assert_eq!(h.log.count(), before);
    }

    #[tokio::test]
    async fn test_update_closes_editor() {
        let h = Harness::start().await;
        let math = h.add_class("Math");
        let page = ClassesPage::new();
        page.render(&h.records, ReadMode::Refetch).await;

        page.begin_edit(&h.records, &math.id);
        let outcome = page
            .update(&h.records, &math.id, fields("Algebra", "Mr. Kim"))
            .await
            .unwrap();
        assert!(outcome.is_submitted());
        assert!(page.editing().is_none());

        let html = page.render(&h.records, ReadMode::Cached).await;
        assert!(html.contains("<strong>Algebra</strong>"));
        assert!(html.contains("Mr. Kim"));
    }

    #[tokio::test]
    async fn test_update_of_other_class_is_rejected() {
        let h = Harness::start().await;
        let math = h.add_class("Math");
        let art = h.add_class("Art");
        let page = ClassesPage::new();

        let outcome = page
            .update(&h.records, &math.id, fields("Math", "Ms. Lee"))
            .await
            .unwrap();
        assert_eq!(outcome, Submission::Rejected);

        page.render(&h.records, ReadMode::Refetch).await;
        page.begin_edit(&h.records, &math.id);
        let before = h.log.count();
        let outcome = page
            .update(&h.records, &art.id, fields("Sculpture", "Ms. Lee"))
            .await
            .unwrap();
        assert_eq!(outcome, Submission::Rejected);
        assert_eq!(h.log.count(), before);
        assert_eq!(page.editing(), Some(math));
    }

    #[tokio::test]
    async fn test_failed_delete_is_reported_once() {
        let h = Harness::start().await;
        let page = ClassesPage::new();
        page.render(&h.records, ReadMode::Refetch).await;

        let err = page.delete(&h.records, "ghost").await.unwrap_err();
        page.report(&err);

        let html = page.render(&h.records, ReadMode::Cached).await;
        assert!(html.contains("Last action failed: class not found"));
        let html = page.render(&h.records, ReadMode::Cached).await;
        assert!(!html.contains("Last action failed"));
    }

    #[tokio::test]
    async fn test_list_error_is_rendered() {
        let h = Harness::start().await;
        let records = Records::new(
            crate::api::RecordClient::new(format!("{}/missing", h.records.client.base_url())),
            h.records.cache.clone(),
            h.records.render_wait,
        );
        let page = ClassesPage::new();
        let html = page.render(&records, ReadMode::Refetch).await;
        assert!(html.contains("Error: HTTP 404"));
    }
}
