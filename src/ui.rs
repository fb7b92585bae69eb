use crate::forms::{FormState, Forms};
use crate::models::HabitId;
use crate::routing;
use crate::state::Session;
use crate::store::HabitStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub id: HabitId,
    pub icon: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub title: String,
    pub percent_label: String,
    pub bar_width: String,
    pub next_day: String,
}

impl HeaderView {
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            percent_label: String::new(),
            bar_width: "0%".to_string(),
            next_day: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRow {
    pub index: usize,
    pub number: usize,
    pub comment: String,
}

pub fn nav_items(store: &HabitStore) -> Vec<NavItem> {
    let active = store.active_id();
    store
        .habits()
        .iter()
        .map(|habit| NavItem {
            id: habit.id,
            icon: habit.icon.clone(),
            name: habit.name.clone(),
            active: Some(habit.id) == active,
        })
        .collect()
}

pub fn header(store: &HabitStore) -> HeaderView {
    let Some(habit) = store.active() else {
        return HeaderView::empty();
    };
    let progress = habit.progress();
    HeaderView {
        title: habit.name.clone(),
        percent_label: progress.label(),
        bar_width: progress.bar_width(),
        next_day: format!("Day {}", habit.days.len() + 1),
    }
}

pub fn day_rows(store: &HabitStore) -> Vec<DayRow> {
    store
        .active()
        .map(|habit| {
            habit
                .days
                .iter()
                .enumerate()
                .map(|(index, day)| DayRow {
                    index,
                    number: index + 1,
                    comment: day.comment.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn render_page(session: &Session) -> String {
    let store = &session.store;
    let active = store.active_id();
    let head = header(store);
    fill(
        INDEX_HTML,
        &[
            ("NAV", render_nav(&nav_items(store))),
            ("HEADER", render_header(&head, active)),
            ("DAYS", render_days(active, &day_rows(store))),
            ("ADD_DAY", render_add_day(active, &session.forms.add_day, &head.next_day)),
            ("POPUP", render_popup(&session.forms)),
            ("FRAGMENT", routing::fragment(active)),
        ],
    )
}

// Placeholders are only looked up in the template itself, never in the
// values substituted into it.
fn fill(template: &str, slots: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let slot = after.find("}}").and_then(|end| {
            slots
                .iter()
                .find(|(name, _)| *name == &after[..end])
                .map(|(_, value)| (end, value))
        });
        match slot {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_nav(items: &[NavItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                r#"<form method="post" action="/habits/{id}/select"><button class="menu__item{active}" type="submit" data-habit-id="{id}" title="{name}"><span class="menu__icon">{icon}</span></button></form>"#,
                id = item.id,
                active = if item.active { " menu__item_active" } else { "" },
                name = escape(&item.name),
                icon = escape(&item.icon),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_header(head: &HeaderView, active: Option<HabitId>) -> String {
    let delete = active
        .map(|id| {
            format!(
                r#"<form method="post" action="/habits/{id}/delete"><button class="header__delete" type="submit">Delete habit</button></form>"#
            )
        })
        .unwrap_or_default();
    format!(
        r#"<h1 class="h1">{title}</h1>
      {delete}
      <div class="progress">
        <div class="progress__text">
          <span class="progress__name">Progress</span>
          <span class="progress__percent">{label}</span>
        </div>
        <div class="progress__bar"><div class="progress__cover_bar" style="width: {width}"></div></div>
      </div>"#,
        title = escape(&head.title),
        label = escape(&head.percent_label),
        width = escape(&head.bar_width),
    )
}

fn render_days(active: Option<HabitId>, rows: &[DayRow]) -> String {
    let Some(habit) = active else {
        return String::new();
    };
    rows.iter()
        .map(|row| {
            format!(
                r#"<div class="habit"><div class="habit__day">Day {number}</div><div class="habit__comment">{comment}</div><form method="post" action="/habits/{habit}/days/{index}/delete"><button class="habit__delete" type="submit" aria-label="Delete Day {number}">&times;</button></form></div>"#,
                number = row.number,
                comment = escape(&row.comment),
                index = row.index,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_add_day(active: Option<HabitId>, form: &FormState, next_day: &str) -> String {
    // With nothing active the form stays visible but cannot be submitted.
    let (action, disabled) = match active {
        Some(id) => (format!(r#" action="/habits/{id}/days""#), ""),
        None => (String::new(), " disabled"),
    };
    format!(
        r#"<div class="habit"><div class="habit__day">{next_day}</div><form class="habit__form" method="post"{action}><fieldset class="habit__fields"{disabled}><input class="input{error}" type="text" name="comment" placeholder="Comment" value="{comment}" /><button class="button" type="submit">Done</button></fieldset></form></div>"#,
        next_day = escape(next_day),
        error = error_class(form, "comment"),
        comment = escape(form.value("comment")),
    )
}

fn render_popup(forms: &Forms) -> String {
    let icons = forms
        .icons
        .options()
        .map(|(tag, active)| {
            format!(
                r#"<form method="post" action="/icon/{tag}"><button class="icon{active}" type="submit">{label}</button></form>"#,
                tag = escape(tag),
                active = if active { " icon_active" } else { "" },
                label = escape(tag),
            )
        })
        .collect::<Vec<_>>()
        .join("");
    let form = &forms.add_habit;
    format!(
        r#"<div id="add-habit-popup" class="cover{hidden}">
      <div class="popup">
        <form class="popup__close" method="post" action="/popup/toggle"><button type="submit" aria-label="Close">&times;</button></form>
        <h2>New habit</h2>
        <div class="icon-select">{icons}</div>
        <form class="popup__form" method="post" action="/habits">
          <input class="input{name_error}" type="text" name="name" placeholder="Name" value="{name}" />
          <input type="hidden" name="icon" value="{icon}" />
          <input class="input{target_error}" type="number" min="1" name="target" placeholder="Target" value="{target}" />
          <button class="button" type="submit">Add</button>
        </form>
      </div>
    </div>"#,
        hidden = if forms.popup_open { "" } else { " cover_hidden" },
        name_error = error_class(form, "name"),
        name = escape(form.value("name")),
        icon = escape(form.value("icon")),
        target_error = error_class(form, "target"),
        target = escape(form.value("target")),
    )
}

fn error_class(form: &FormState, field: &str) -> &'static str {
    if form.is_invalid(field) { " error" } else { "" }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Habit Tracker</title>
  <style>
    :root {
      --bg: #f3f6fb;
      --ink: #1f2430;
      --muted: #7b8499;
      --accent: #5051f9;
      --error: #d8433a;
      --card: #ffffff;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      display: flex;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
    }

    form {
      margin: 0;
    }

    .menu {
      width: 96px;
      padding: 24px 16px;
      background: var(--card);
      display: flex;
      flex-direction: column;
      align-items: center;
      gap: 12px;
    }

    .menu__list {
      display: flex;
      flex-direction: column;
      gap: 12px;
    }

    .menu__item,
    .menu__add {
      width: 56px;
      height: 56px;
      border: none;
      border-radius: 16px;
      background: var(--bg);
      cursor: pointer;
      font-size: 0.7rem;
    }

    .menu__item_active {
      background: var(--accent);
      color: white;
    }

    main {
      flex: 1;
      padding: 32px 40px;
      display: grid;
      gap: 24px;
      align-content: start;
    }

    header {
      display: grid;
      grid-template-columns: 1fr auto;
      gap: 16px;
      align-items: center;
    }

    .h1 {
      margin: 0;
      min-height: 1.2em;
    }

    .progress {
      grid-column: 1 / -1;
    }

    .progress__text {
      display: flex;
      justify-content: space-between;
      color: var(--muted);
    }

    .progress__bar {
      margin-top: 8px;
      height: 8px;
      border-radius: 4px;
      background: #e1e5ee;
    }

    .progress__cover_bar {
      height: 100%;
      border-radius: 4px;
      background: var(--accent);
    }

    .habit {
      display: flex;
      align-items: center;
      gap: 16px;
      padding: 12px 16px;
      background: var(--card);
      border-radius: 12px;
    }

    .habit__day {
      min-width: 72px;
      color: var(--muted);
    }

    .habit__comment,
    .habit__form {
      flex: 1;
    }

    .habit__form {
      display: flex;
      gap: 12px;
    }

    .input {
      flex: 1;
      padding: 10px 12px;
      border: 1px solid #d5dae6;
      border-radius: 8px;
    }

    .input.error {
      border-color: var(--error);
    }

    .button,
    .habit__delete,
    .header__delete,
    .icon {
      border: none;
      border-radius: 8px;
      padding: 10px 14px;
      cursor: pointer;
    }

    .button {
      background: var(--accent);
      color: white;
    }

    .cover {
      position: fixed;
      inset: 0;
      display: grid;
      place-items: center;
      background: rgba(31, 36, 48, 0.4);
    }

    .cover_hidden {
      display: none;
    }

    .popup {
      width: min(420px, 90vw);
      padding: 24px;
      background: var(--card);
      border-radius: 16px;
      display: grid;
      gap: 16px;
    }

    .popup__form {
      display: grid;
      gap: 12px;
    }

    .icon-select {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
    }

    .icon_active {
      background: var(--accent);
      color: white;
    }
  </style>
</head>
<body>
  <aside class="menu">
    <nav class="menu__list">
{{NAV}}
    </nav>
    <form method="post" action="/popup/toggle"><button class="menu__add" type="submit" aria-label="New habit">+</button></form>
  </aside>

  <main>
    <header>
      {{HEADER}}
    </header>

    <section id="days">
{{DAYS}}
    </section>

    {{ADD_DAY}}
  </main>

  {{POPUP}}

  <script>
    (function () {
      var active = '{{FRAGMENT}}';
      if (location.hash && location.hash !== active) {
        location.replace('/select/' + encodeURIComponent(location.hash.slice(1)));
      } else if (!location.hash && active) {
        history.replaceState(null, '', '/' + active);
      }
    })();
  </script>
</body>
</html>
"#;
