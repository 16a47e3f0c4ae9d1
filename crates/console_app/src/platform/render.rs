//! Plain-text rendering of the view models.

use std::fmt::Write;

use chrono::{DateTime, Local};
use console_core::{
    AppViewModel, AutoRefresh, Loadable, LogPane, NotificationLevel, PaneView, PromptEditor,
    Recommendation, ResultsPane, SettingsPane, TasksPane,
};

pub(crate) fn render(view: &AppViewModel, now: DateTime<Local>) -> String {
    let mut out = String::new();
    let title = view.view.map(|v| v.as_str()).unwrap_or("none");
    let _ = writeln!(
        out,
        "== {} == [{}] (session {})",
        title,
        now.format("%H:%M:%S"),
        view.generation
    );
    let _ = writeln!(
        out,
        "scraper: {} | control: {}{}",
        view.scraper.state.as_str(),
        view.scraper.control_label,
        if view.scraper.control_enabled { "" } else { " (busy)" },
    );

    for note in &view.notifications {
        let marker = match note.level {
            NotificationLevel::Info => "i",
            NotificationLevel::Error => "!",
        };
        let _ = writeln!(out, "{marker} {}", note.text);
    }

    match &view.pane {
        PaneView::Blank => {}
        PaneView::Tasks(pane) => render_tasks(&mut out, pane),
        PaneView::Results(pane) => render_results(&mut out, pane),
        PaneView::Logs(pane) => render_logs(&mut out, pane),
        PaneView::Settings(pane) => render_settings(&mut out, pane),
    }
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn render_tasks(out: &mut String, pane: &TasksPane) {
    if let Some(placeholder) = pane.placeholder {
        let _ = writeln!(out, "{placeholder}");
    }
    for row in &pane.rows {
        let _ = writeln!(
            out,
            "#{} {} [{}] keyword={} price={} pages={} cron={} personal_only={} criteria={}{}",
            row.id,
            row.task_name,
            if row.enabled { "enabled" } else { "disabled" },
            row.keyword,
            row.price_range,
            row.max_pages,
            row.cron.as_deref().unwrap_or("-"),
            yes_no(row.personal_only),
            row.criteria,
            if row.deleting { " (deleting...)" } else { "" },
        );
        let _ = writeln!(
            out,
            "    status: {} | action: {}{}",
            if row.is_running { "running" } else { "idle" },
            row.run_label,
            if row.run_enabled { "" } else { " (busy)" },
        );
        if let Some(draft) = &row.draft {
            let _ = writeln!(
                out,
                "    editing: task_name={:?} keyword={:?} min_price={:?} max_price={:?} max_pages={:?} cron={:?} personal_only={} enabled={}",
                draft.task_name,
                draft.keyword,
                draft.min_price,
                draft.max_price,
                draft.max_pages,
                draft.cron,
                draft.personal_only,
                draft.enabled,
            );
        }
    }
}

fn render_results(out: &mut String, pane: &ResultsPane) {
    if !pane.sources.is_empty() {
        let sources: Vec<String> = pane
            .sources
            .iter()
            .map(|source| {
                if pane.selected.as_deref() == Some(source.as_str()) {
                    format!("[{source}]")
                } else {
                    source.clone()
                }
            })
            .collect();
        let _ = writeln!(out, "sources: {}", sources.join(" "));
        let _ = writeln!(
            out,
            "recommended only: {} | sort: {} {} | page {} ({} per page, {} total)",
            yes_no(pane.recommended_only),
            pane.sort_by.as_str(),
            pane.sort_order.as_str(),
            pane.page,
            pane.limit,
            pane.total_items,
        );
    }
    if let Some(placeholder) = pane.placeholder {
        let _ = writeln!(out, "{placeholder}");
    }
    if let Some((number, text)) = &pane.raw_json {
        let _ = writeln!(out, "--- record {number} (close to return) ---");
        let _ = writeln!(out, "{text}");
        return;
    }
    for (index, card) in pane.cards.iter().enumerate() {
        let verdict = match card.recommendation {
            Recommendation::Recommended => "recommended",
            Recommendation::NotRecommended => "not recommended",
            Recommendation::Undecided => "pending",
        };
        let _ = writeln!(
            out,
            "{}. {} | {} | {}",
            index + 1,
            card.title,
            card.price,
            verdict
        );
        let _ = writeln!(out, "    {}", card.reason);
        let _ = writeln!(
            out,
            "    seller {} | published {} | crawled {}",
            card.seller, card.publish_time, card.crawl_time
        );
        if let Some(link) = &card.link {
            let _ = writeln!(out, "    {link}");
        }
    }
}

fn render_logs(out: &mut String, pane: &LogPane) {
    let auto = match pane.auto_refresh {
        AutoRefresh::On => "on",
        AutoRefresh::Off => "off",
    };
    let _ = writeln!(
        out,
        "auto-refresh {} | lines {}-{} of {} | offset {}",
        auto,
        (pane.scroll_top + 1).min(pane.total_lines),
        pane.scroll_top + pane.lines.len().min(pane.total_lines),
        pane.total_lines,
        pane.cursor
    );
    for line in &pane.lines {
        let _ = writeln!(out, "{line}");
    }
}

fn render_settings(out: &mut String, pane: &SettingsPane) {
    match &pane.status {
        Loadable::Loading => {
            let _ = writeln!(out, "status: loading...");
        }
        Loadable::Failed => {
            let _ = writeln!(out, "status: could not load system status");
        }
        Loadable::Ready(status) => {
            let _ = writeln!(out, "scraper running: {}", yes_no(status.scraper_running));
            let _ = writeln!(
                out,
                "login state file: {} ({})",
                yes_no(status.login_state_file.exists),
                status.login_state_file.path.as_deref().unwrap_or("-")
            );
            let env = &status.env_file;
            let _ = writeln!(
                out,
                ".env: {} | OPENAI_API_KEY {} | OPENAI_BASE_URL {} | OPENAI_MODEL_NAME {} | NTFY_TOPIC_URL {}",
                yes_no(env.exists),
                yes_no(env.openai_api_key_set),
                yes_no(env.openai_base_url_set),
                yes_no(env.openai_model_name_set),
                yes_no(env.ntfy_topic_url_set),
            );
        }
    }

    match &pane.prompts {
        Loadable::Loading => {
            let _ = writeln!(out, "prompts: loading...");
        }
        Loadable::Failed => {
            let _ = writeln!(out, "prompts: could not load prompt list");
        }
        Loadable::Ready(files) if files.is_empty() => {
            let _ = writeln!(out, "prompts: none");
        }
        Loadable::Ready(files) => {
            let _ = writeln!(out, "prompts: {}", files.join(" "));
        }
    }

    match &pane.editor {
        PromptEditor::Unselected => {}
        PromptEditor::Loading => {
            let _ = writeln!(out, "loading {}...", pane.selected.as_deref().unwrap_or(""));
        }
        PromptEditor::Failed => {
            let _ = writeln!(out, "could not load {}", pane.selected.as_deref().unwrap_or(""));
        }
        PromptEditor::Editing { draft } => {
            let _ = writeln!(
                out,
                "--- {}{} ---",
                pane.selected.as_deref().unwrap_or(""),
                if pane.saving { " (saving...)" } else { "" }
            );
            let _ = writeln!(out, "{draft}");
        }
    }
}
