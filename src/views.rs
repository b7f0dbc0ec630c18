//! Server-rendered pages. Plain HTML assembled with `format!`; every
//! user-supplied value goes through `escape` first.

use crate::auth::Role;
use crate::entity::{account_type, department};
use crate::forms::{
    AccountTypeForm, DepartmentForm, EmployeeForm, FieldErrors, ManagerForm, ProfileForm,
};
use crate::service::employee::EmployeeRecord;
use crate::service::manager::ManagerRecord;
use crate::service::profile::ProfileRecord;

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, role: Option<Role>, flash: Option<&str>, content: &str) -> String {
    let nav = match role {
        Some(Role::Admin) => {
            r#"<nav><a href="/manager">Employees</a> <a href="/admin">Administration</a> <a href="/generate_pdf">Export PDF</a> <a href="/logout">Log out</a></nav>"#
        }
        Some(Role::Manager) => {
            r#"<nav><a href="/manager">Employees</a> <a href="/generate_pdf">Export PDF</a> <a href="/logout">Log out</a></nav>"#
        }
        _ => "",
    };
    let flash_html = flash
        .map(|msg| format!(r#"<p class="flash">{}</p>"#, escape(msg)))
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - staffdesk</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
table {{ border-collapse: collapse; }}
th, td {{ border: 1px solid #999; padding: 0.3rem 0.6rem; }}
th {{ background: #555; color: #fff; }}
.flash {{ background: #e6ffe6; border: 1px solid #9c9; padding: 0.5rem; }}
.error {{ color: #b00; }}
nav a {{ margin-right: 1rem; }}
</style>
</head>
<body>
{nav}
{flash_html}
<h1>{title}</h1>
{content}
</body>
</html>
"#,
        title = escape(title),
        nav = nav,
        flash_html = flash_html,
        content = content
    )
}

pub fn login_page(error: Option<&str>) -> String {
    let error_html = error
        .map(|msg| format!(r#"<p class="error">{}</p>"#, escape(msg)))
        .unwrap_or_default();
    let content = format!(
        r#"{error_html}
<form method="post" action="/login">
<p><label>Username <input type="text" name="username"></label></p>
<p><label>Password <input type="password" name="password"></label></p>
<p><button type="submit">Log in</button></p>
</form>"#
    );
    layout("Log in", None, None, &content)
}

pub fn manager_dashboard(
    role: Role,
    records: &[EmployeeRecord],
    query: &str,
    flash: Option<&str>,
) -> String {
    let mut rows = String::new();
    for r in records {
        rows.push_str(&format!(
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>
<td><a href="/employee/{id}/edit">Edit</a> <a href="/employee/{id}/delete">Delete</a> <a href="/generate_pdf/{id}">PDF</a></td></tr>
"#,
            escape(&r.last_name),
            escape(&r.first_name),
            escape(&r.email),
            escape(r.department.as_deref().unwrap_or("")),
            escape(&r.account_types_joined()),
            id = r.id,
        ));
    }
    let content = format!(
        r#"<form method="get" action="/manager">
<input type="text" name="q" value="{query}" placeholder="Search employees">
<button type="submit">Search</button>
</form>
<p><a href="/add_employee">Add employee</a></p>
<table>
<tr><th>Last name</th><th>First name</th><th>Email</th><th>Department</th><th>Account types</th><th></th></tr>
{rows}
</table>"#,
        query = escape(query),
        rows = rows
    );
    layout("Employees", Some(role), flash, &content)
}

pub fn admin_dashboard(
    managers: &[ManagerRecord],
    departments: &[department::Model],
    account_types: &[account_type::Model],
    profiles: &[ProfileRecord],
    flash: Option<&str>,
) -> String {
    let mut manager_rows = String::new();
    for m in managers {
        manager_rows.push_str(&format!(
            r#"<tr><td>{}</td><td>{} {}</td><td>{}</td>
<td><a href="/edit_manager/{id}">Edit</a> <a href="/delete_manager/{id}">Delete</a></td></tr>
"#,
            escape(&m.username),
            escape(&m.first_name),
            escape(&m.last_name),
            escape(&m.email),
            id = m.id,
        ));
    }
    let mut department_rows = String::new();
    for d in departments {
        department_rows.push_str(&format!(
            r#"<tr><td>{}</td><td><a href="/department/{id}/edit">Edit</a> <a href="/department/{id}/delete">Delete</a></td></tr>
"#,
            escape(&d.name),
            id = d.id,
        ));
    }
    let mut account_type_rows = String::new();
    for a in account_types {
        account_type_rows.push_str(&format!(
            r#"<tr><td>{}</td><td>{}</td><td><a href="/account_type/{id}/edit">Edit</a> <a href="/account_type/{id}/delete">Delete</a></td></tr>
"#,
            escape(&a.name),
            escape(a.description.as_deref().unwrap_or("")),
            id = a.id,
        ));
    }
    let mut profile_rows = String::new();
    for p in profiles {
        profile_rows.push_str(&format!(
            r#"<tr><td>{}</td><td>{}</td><td><a href="/profile/{id}/edit">Edit</a> <a href="/profile/{id}/delete">Delete</a></td></tr>
"#,
            escape(&p.name),
            escape(&p.account_type_names.join(", ")),
            id = p.id,
        ));
    }
    let content = format!(
        r#"<h2>Managers</h2>
<p><a href="/add_manager">Add manager</a></p>
<table><tr><th>Username</th><th>Name</th><th>Email</th><th></th></tr>{manager_rows}</table>
<h2>Departments</h2>
<p><a href="/add_department">Add department</a></p>
<table><tr><th>Name</th><th></th></tr>{department_rows}</table>
<h2>Account types</h2>
<p><a href="/add_account_type">Add account type</a></p>
<table><tr><th>Name</th><th>Description</th><th></th></tr>{account_type_rows}</table>
<h2>Profiles</h2>
<p><a href="/add_profile">Add profile</a></p>
<table><tr><th>Name</th><th>Account types</th><th></th></tr>{profile_rows}</table>"#
    );
    layout("Administration", Some(Role::Admin), flash, &content)
}

fn field_error(errors: &FieldErrors, field: &str) -> String {
    errors
        .get(field)
        .map(|msg| format!(r#" <span class="error">{}</span>"#, escape(msg)))
        .unwrap_or_default()
}

fn text_field(
    label: &str,
    name: &str,
    kind: &str,
    value: &str,
    errors: &FieldErrors,
) -> String {
    format!(
        r#"<p><label>{label} <input type="{kind}" name="{name}" value="{value}"></label>{error}</p>
"#,
        label = escape(label),
        kind = kind,
        name = name,
        value = escape(value),
        error = field_error(errors, name),
    )
}

fn account_type_checkboxes(
    account_types: &[account_type::Model],
    selected: &[String],
    errors: &FieldErrors,
) -> String {
    let mut boxes = String::new();
    for a in account_types {
        let id_str = a.id.to_string();
        let checked = if selected.contains(&id_str) { " checked" } else { "" };
        boxes.push_str(&format!(
            r#"<label><input type="checkbox" name="account_types" value="{}"{}> {}</label><br>
"#,
            a.id,
            checked,
            escape(&a.name),
        ));
    }
    format!(
        r#"<p>Account types{error}</p><div id="id_account_types">{boxes}</div>
"#,
        error = field_error(errors, "account_types"),
        boxes = boxes,
    )
}

pub fn department_form_page(
    title: &str,
    action: &str,
    form: &DepartmentForm,
    errors: &FieldErrors,
) -> String {
    let content = format!(
        r#"<form method="post" action="{action}">
{name}
<p><button type="submit">Save</button> <a href="/admin">Cancel</a></p>
</form>"#,
        action = action,
        name = text_field("Name", "name", "text", &form.name, errors),
    );
    layout(title, Some(Role::Admin), None, &content)
}

pub fn account_type_form_page(
    title: &str,
    action: &str,
    form: &AccountTypeForm,
    errors: &FieldErrors,
) -> String {
    let content = format!(
        r#"<form method="post" action="{action}">
{name}
<p><label>Description <textarea name="description">{description}</textarea></label>{description_error}</p>
<p><button type="submit">Save</button> <a href="/admin">Cancel</a></p>
</form>"#,
        action = action,
        name = text_field("Name", "name", "text", &form.name, errors),
        description = escape(&form.description),
        description_error = field_error(errors, "description"),
    );
    layout(title, Some(Role::Admin), None, &content)
}

pub fn profile_form_page(
    title: &str,
    action: &str,
    form: &ProfileForm,
    account_types: &[account_type::Model],
    errors: &FieldErrors,
) -> String {
    let content = format!(
        r#"<form method="post" action="{action}">
{name}
{checkboxes}
<p><button type="submit">Save</button> <a href="/admin">Cancel</a></p>
</form>"#,
        action = action,
        name = text_field("Profile name", "name", "text", &form.name, errors),
        checkboxes = account_type_checkboxes(account_types, &form.account_type_ids, errors),
    );
    layout(title, Some(Role::Admin), None, &content)
}

pub fn manager_form_page(
    title: &str,
    action: &str,
    form: &ManagerForm,
    errors: &FieldErrors,
    password_hint: bool,
) -> String {
    let hint = if password_hint {
        "<p><em>Leave the password blank to keep the current one.</em></p>"
    } else {
        ""
    };
    let content = format!(
        r#"<form method="post" action="{action}">
{username}{first_name}{last_name}{email}
<p><label>Password <input type="password" name="password" value=""></label>{password_error}</p>
{hint}
<p><button type="submit">Save</button> <a href="/admin">Cancel</a></p>
</form>"#,
        action = action,
        username = text_field("Username", "username", "text", &form.username, errors),
        first_name = text_field("First name", "first_name", "text", &form.first_name, errors),
        last_name = text_field("Last name", "last_name", "text", &form.last_name, errors),
        email = text_field("Email", "email", "text", &form.email, errors),
        password_error = field_error(errors, "password"),
        hint = hint,
    );
    layout(title, Some(Role::Admin), None, &content)
}

pub fn employee_form_page(
    role: Role,
    title: &str,
    action: &str,
    form: &EmployeeForm,
    departments: &[department::Model],
    account_types: &[account_type::Model],
    profiles: &[ProfileRecord],
    errors: &FieldErrors,
) -> String {
    let mut department_options = String::from(r#"<option value="">---------</option>"#);
    for d in departments {
        let selected = if form.department_id == d.id.to_string() {
            " selected"
        } else {
            ""
        };
        department_options.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            d.id,
            selected,
            escape(&d.name)
        ));
    }
    let mut profile_options = String::from(r#"<option value="">---------</option>"#);
    for p in profiles {
        profile_options.push_str(&format!(
            r#"<option value="{}">{}</option>"#,
            p.id,
            escape(&p.name)
        ));
    }
    let content = format!(
        r##"<form method="post" action="{action}">
{first_name}{last_name}{email}
<p><label>Department <select name="department">{department_options}</select></label>{department_error}</p>
<p><label>Hire date <input type="date" name="hire_date" value="{hire_date}"></label>{hire_date_error}</p>
<p><label>Profile <select id="id_profile">{profile_options}</select></label> <em>(pre-fills the account types below)</em></p>
{checkboxes}
<p><button type="submit">Save</button> <a href="/manager">Cancel</a></p>
</form>
<script>
document.addEventListener("DOMContentLoaded", function () {{
    const profileSelect = document.querySelector("#id_profile");
    const container = document.querySelector("#id_account_types");
    if (!profileSelect || !container) return;
    profileSelect.addEventListener("change", function () {{
        if (!profileSelect.value) return;
        fetch("/get_account_types?profile_id=" + profileSelect.value)
            .then(r => r.json())
            .then(data => {{
                container.querySelectorAll("input[type='checkbox']").forEach(cb => {{
                    cb.checked = data.account_types.includes(parseInt(cb.value));
                }});
            }});
    }});
}});
</script>"##,
        action = action,
        first_name = text_field("First name", "first_name", "text", &form.first_name, errors),
        last_name = text_field("Last name", "last_name", "text", &form.last_name, errors),
        email = text_field("Email", "email", "text", &form.email, errors),
        department_options = department_options,
        department_error = field_error(errors, "department"),
        hire_date = escape(&form.hire_date),
        hire_date_error = field_error(errors, "hire_date"),
        profile_options = profile_options,
        checkboxes = account_type_checkboxes(account_types, &form.account_type_ids, errors),
    );
    layout(title, Some(role), None, &content)
}

pub fn confirm_delete_page(
    role: Role,
    title: &str,
    subject: &str,
    action: &str,
    cancel: &str,
) -> String {
    let content = format!(
        r#"<p>Are you sure you want to delete {subject}?</p>
<form method="post" action="{action}">
<button type="submit">Yes, delete</button> <a href="{cancel}">Cancel</a>
</form>"#,
        subject = escape(subject),
        action = action,
        cancel = cancel,
    );
    layout(title, Some(role), None, &content)
}
