use super::layout::{self, escape, id_segment};
use super::{EditState, Records};
use crate::api::ApiError;
use crate::cache::{keys, QueryState, ReadMode};
use crate::forms::{Submission, TaskFields, TaskForm};
use crate::models::{Class, DeleteResponse, Task};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

const HEADING: &str = "Tasks";

/// Page URL that renders from the cache instead of refetching
pub const CACHED_VIEW: &str = "/tasks?cached=true";

#[derive(Debug, Default)]
struct PageState {
    edit: EditState<Task, TaskForm>,
    create_form: TaskForm,
    notice: Option<String>,
}

/// State of the tasks page between requests. Locked only between awaits.
#[derive(Debug, Default)]
pub struct TasksPage {
    state: Mutex<PageState>,
}

/// Display label for a task's class: its name, or the raw id if unknown
pub fn class_label<'a>(names: &HashMap<&str, &'a str>, class_id: &'a str) -> &'a str {
    names.get(class_id).copied().unwrap_or(class_id)
}

fn class_names(classes: &[Class]) -> HashMap<&str, &str> {
    classes
        .iter()
        .map(|c| (c.id.as_str(), c.class_name.as_str()))
        .collect()
}

impl TasksPage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap()
    }

    #[cfg(test)]
    fn editing(&self) -> Option<Task> {
        self.state().edit.record().cloned()
    }

    pub fn begin_edit(&self, records: &Records, id: &str) -> bool {
        let Some(task) = records.cached_tasks().into_iter().find(|t| t.id == id) else {
            tracing::debug!("Task {} not in cached list, not editing", id);
            return false;
        };
        let form = TaskForm::new(&records.cached_classes(), Some(&task.payload()));
        self.state().edit = EditState::Editing { record: task, form };
        true
    }

    pub fn cancel_edit(&self) {
        self.state().edit = EditState::Idle;
    }

    pub async fn create(&self, records: &Records, fields: TaskFields) -> Result<Submission<Task>, ApiError> {
        let mut form = self.state().create_form.clone();
        form.apply(fields);
        let client = &records.client;
        let outcome = form
            .submit(|payload| async move { client.create_task(&payload).await })
            .await;
        self.state().create_form = form;

        if matches!(outcome, Ok(Submission::Submitted(_))) {
            records.cache.invalidate(keys::TASKS);
        }
        outcome
    }

    pub async fn update(&self, records: &Records, id: &str, fields: TaskFields) -> Result<Submission<Task>, ApiError> {
        let mut form = match &self.state().edit {
            EditState::Editing { record, form } if record.id == id => form.clone(),
            _ => {
                tracing::warn!("Update for task {} which is not being edited", id);
                return Ok(Submission::Rejected);
            }
        };
        form.apply(fields);
        let client = &records.client;
        let outcome = form
            .submit(|payload| async move { client.update_task(id, &payload).await })
            .await;
        let submitted = matches!(outcome, Ok(Submission::Submitted(_)));

        {
            let mut state = self.state();
            if state.edit.record().is_some_and(|t| t.id == id) {
                if submitted {
                    state.edit = EditState::Idle;
                } else if let EditState::Editing { form: current, .. } = &mut state.edit {
                    *current = form;
                }
            }
        }

        if submitted {
            records.cache.invalidate(keys::TASKS);
        }
        outcome
    }

    pub async fn delete(&self, records: &Records, id: &str) -> Result<DeleteResponse, ApiError> {
        let response = records.client.delete_task(id).await?;
        records.cache.invalidate(keys::TASKS);
        Ok(response)
    }

    /// Close or reopen a task
    pub async fn set_closed(&self, records: &Records, id: &str, closed: bool) -> Result<Task, ApiError> {
        let task = if closed {
            records.client.close_task(id).await?
        } else {
            records.client.open_task(id).await?
        };
        records.cache.invalidate(keys::TASKS);
        Ok(task)
    }

    pub fn report(&self, err: &ApiError) {
        self.state().notice = Some(err.to_string());
    }

    pub async fn render(&self, records: &Records, mode: ReadMode) -> String {
        let (tasks, classes) = tokio::join!(records.tasks(mode), records.classes(mode));
        let class_list: &[Class] = classes.data.as_deref().map(Vec::as_slice).unwrap_or(&[]);

        let mut state = self.state();
        let notice = state.notice.take();
        state.create_form.sync_classes(class_list);
        state.view(&tasks, class_list, notice.as_deref())
    }
}

impl PageState {
    fn view(&self, tasks: &QueryState<Vec<Task>>, classes: &[Class], notice: Option<&str>) -> String {
        if tasks.is_loading {
            return layout::loading(HEADING, CACHED_VIEW);
        }
        if let Some(error) = &tasks.error {
            return layout::page(HEADING, &format!(r#"<p class="error">Error: {}</p>"#, escape(error)));
        }

        let mut body = format!("<h2>{}</h2>\n", HEADING);
        body.push_str(&layout::notice(notice));
        body.push_str(&form_html(&self.create_form, classes, "/tasks", "Create"));

        if let EditState::Editing { record, form } = &self.edit {
            body.push_str(r#"<div class="panel"><p><strong>Edit Task</strong></p>"#);
            body.push_str(&form_html(
                form,
                classes,
                &format!("/tasks/{}/update", id_segment(&record.id)),
                "Update",
            ));
            body.push_str(
                r#"<form class="inline" method="post" action="/tasks/cancel"><button class="link" type="submit">Cancel</button></form></div>"#,
            );
        }

        let names = class_names(classes);
        body.push_str("\n<ul class=\"rows\">\n");
        for task in tasks.data.iter().flat_map(|list| list.iter()) {
            body.push_str(&row_html(task, class_label(&names, &task.class_id)));
        }
        body.push_str("</ul>");

        layout::page(HEADING, &body)
    }
}

fn form_html(form: &TaskForm, classes: &[Class], action: &str, label: &str) -> String {
    let mut options = String::new();
    for class in classes {
        let selected = if class.id == form.class_id { " selected" } else { "" };
        options.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            escape(&class.id),
            selected,
            escape(&class.class_name)
        ));
    }
    // keep an unresolvable selection visible instead of silently switching it
    if !form.class_id.is_empty() && !classes.iter().any(|c| c.id == form.class_id) {
        options.push_str(&format!(
            r#"<option value="{id}" selected>{id}</option>"#,
            id = escape(&form.class_id)
        ));
    }

    format!(
        r#"<form class="fields" method="post" action="{action}">
<select name="class_id">{options}</select>
<input name="title" placeholder="Title" value="{title}">
<input name="description" placeholder="Description" value="{description}">
<button class="primary" type="submit">{label}</button>
</form>
"#,
        action = action,
        options = options,
        title = escape(&form.title),
        description = escape(&form.description),
        label = label,
    )
}

fn row_html(task: &Task, class_label: &str) -> String {
    let id = id_segment(&task.id);
    let mut status = if task.is_closed { "closed".to_string() } else { "open".to_string() };
    if let Some(due) = task.due_at {
        status.push_str(&format!(", due {}", due.format("%Y-%m-%d %H:%M UTC")));
    }
    let (toggle_action, toggle_label) = if task.is_closed {
        ("open", "Reopen")
    } else {
        ("close", "Close")
    };

    format!(
        r#"<li data-id="{data_id}">
<div><div><strong>{title}</strong></div><div class="muted"><span class="class-label">{label}</span> — {description}</div><div class="muted">{status}</div></div>
<div>
<form class="inline" method="post" action="/tasks/{id}/edit"><button class="link" type="submit">Edit</button></form>
<form class="inline" method="post" action="/tasks/{id}/{toggle_action}"><button class="link" type="submit">{toggle_label}</button></form>
<form class="inline" method="post" action="/tasks/{id}/delete"><button class="link danger" type="submit">Delete</button></form>
</div>
</li>
"#,
        data_id = escape(&task.id),
        title = escape(&task.title),
        label = escape(class_label),
        description = escape(&task.description),
        status = status,
        id = id,
        toggle_action = toggle_action,
        toggle_label = toggle_label,
    )
}
