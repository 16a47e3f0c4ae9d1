//! Line-oriented operator commands read from stdin.

use console_core::{
    AutoRefresh, DraftField, Msg, NewTask, RunAction, SortBy, SortOrder, TaskId, View,
};

pub(crate) const HELP: &str = "\
commands:
  view tasks|results|logs|settings   (or just the view name)
  refresh                            reload the active view
  dismiss                            clear notifications
  status | start-all | stop-all      scraper status and control
  show | help | quit
tasks:
  edit N | set N FIELD VALUE | save N | cancel N
  enable N | disable N | run N | halt N | delete N
  new NAME; KEYWORD; DESCRIPTION[; MIN_PRICE[; MAX_PRICE]]
  fields: task_name keyword min_price max_price max_pages cron personal_only enabled
results:
  source FILE | recommended on|off | sort crawl_time|publish_time|price [asc|desc] | page N
  json N | close                     show or hide the raw record of card N
logs:
  auto on|off | clear | scroll N | bottom | height N
settings:
  prompt FILE | text CONTENT (\\n for newlines) | save";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Dispatch(Msg),
    Show,
    Help,
    Quit,
}

/// Parses one input line against the active view.
pub(crate) fn parse(line: &str, active: Option<View>) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let msg = match word.to_ascii_lowercase().as_str() {
        "" | "show" => return Ok(Command::Show),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" | "q" => return Ok(Command::Quit),

        "view" => Msg::Navigate(view_arg(rest)?),
        name if View::parse(name).is_some() && rest.is_empty() => {
            Msg::Navigate(view_arg(name)?)
        }
        "refresh" => match active {
            Some(View::Logs) => Msg::LogRefreshClicked,
            Some(View::Results) => Msg::ResultsRefreshClicked,
            Some(view) => Msg::Navigate(view),
            None => return Err("no active view".to_string()),
        },
        "dismiss" => Msg::NotificationsDismissed,
        "status" => Msg::ScraperStatusRequested,
        "start-all" => Msg::ScraperRunRequested(RunAction::Start),
        "stop-all" => Msg::ScraperRunRequested(RunAction::Stop),

        "edit" => Msg::TaskEditStarted(task_id(rest)?),
        "set" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let id = task_id(parts.next().unwrap_or_default())?;
            let field_name = parts.next().unwrap_or_default();
            let field = DraftField::parse(field_name)
                .ok_or_else(|| format!("unknown field '{field_name}'"))?;
            let value = parts.next().unwrap_or_default().to_string();
            Msg::TaskDraftChanged { id, field, value }
        }
        "save" if active == Some(View::Settings) => Msg::PromptSaveClicked,
        "save" => Msg::TaskEditSaved(task_id(rest)?),
        "cancel" => Msg::TaskEditCancelled(task_id(rest)?),
        "enable" => Msg::TaskEnabledToggled {
            id: task_id(rest)?,
            enabled: true,
        },
        "disable" => Msg::TaskEnabledToggled {
            id: task_id(rest)?,
            enabled: false,
        },
        "run" => Msg::TaskRunRequested {
            id: task_id(rest)?,
            action: RunAction::Start,
        },
        "halt" => Msg::TaskRunRequested {
            id: task_id(rest)?,
            action: RunAction::Stop,
        },
        "delete" => Msg::TaskDeleteRequested(task_id(rest)?),
        "new" => Msg::TaskCreateSubmitted(new_task(rest)?),

        "source" if !rest.is_empty() => Msg::ResultSourceSelected(rest.to_string()),
        "recommended" => Msg::RecommendedOnlySet(on_off(rest)?),
        "sort" => {
            let mut parts = rest.split_whitespace();
            let by_name = parts.next().unwrap_or_default();
            let by = SortBy::parse(by_name).ok_or_else(|| format!("unknown sort key '{by_name}'"))?;
            let order = match parts.next() {
                Some(raw) => {
                    SortOrder::parse(raw).ok_or_else(|| format!("unknown sort order '{raw}'"))?
                }
                None => SortOrder::default(),
            };
            Msg::ResultSortSet { by, order }
        }
        "page" => Msg::ResultPageSet(number(rest)?),
        "json" => match number::<usize>(rest)? {
            0 => return Err("cards are numbered from 1".to_string()),
            card => Msg::ResultJsonOpened(card - 1),
        },
        "close" => Msg::ResultJsonClosed,

        "auto" => Msg::LogAutoRefreshSet(if on_off(rest)? {
            AutoRefresh::On
        } else {
            AutoRefresh::Off
        }),
        "clear" => Msg::LogClearClicked,
        "scroll" => Msg::LogScrolled { top: number(rest)? },
        "bottom" => Msg::LogScrolled { top: usize::MAX },
        "height" => Msg::LogViewportResized {
            height: number(rest)?,
        },

        "prompt" => Msg::PromptSelected((!rest.is_empty()).then(|| rest.to_string())),
        "text" => Msg::PromptEdited(rest.replace("\\n", "\n")),

        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Command::Dispatch(msg))
}

fn view_arg(raw: &str) -> Result<View, String> {
    View::parse(raw).ok_or_else(|| format!("unknown view '{raw}'"))
}

fn task_id(raw: &str) -> Result<TaskId, String> {
    number(raw)
}

fn number<T: std::str::FromStr>(raw: &str) -> Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("expected a number, got '{}'", raw.trim()))
}

fn on_off(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on or off, got '{other}'")),
    }
}

fn new_task(raw: &str) -> Result<NewTask, String> {
    let parts: Vec<&str> = raw.split(';').map(str::trim).collect();
    let [task_name, keyword, description, prices @ ..] = parts.as_slice() else {
        return Err("usage: new NAME; KEYWORD; DESCRIPTION[; MIN_PRICE[; MAX_PRICE]]".to_string());
    };
    if task_name.is_empty() || keyword.is_empty() || description.is_empty() {
        return Err("name, keyword and description are required".to_string());
    }
    let price = |index: usize| {
        prices
            .get(index)
            .and_then(|value| console_core::coerce_text(value))
    };
    Ok(NewTask {
        task_name: task_name.to_string(),
        keyword: keyword.to_string(),
        description: description.to_string(),
        personal_only: true,
        min_price: price(0),
        max_price: price(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn msg(line: &str, active: Option<View>) -> Msg {
        match parse(line, active) {
            Ok(Command::Dispatch(msg)) => msg,
            other => panic!("expected a message for '{line}', got {other:?}"),
        }
    }

    #[test]
    fn navigation() {
        assert_eq!(msg("view logs", None), Msg::Navigate(View::Logs));
        assert_eq!(msg("  Results ", None), Msg::Navigate(View::Results));
        assert!(parse("view nowhere", None).is_err());
    }

    #[test]
    fn refresh_depends_on_active_view() {
        assert_eq!(msg("refresh", Some(View::Logs)), Msg::LogRefreshClicked);
        assert_eq!(
            msg("refresh", Some(View::Results)),
            Msg::ResultsRefreshClicked
        );
        assert_eq!(
            msg("refresh", Some(View::Tasks)),
            Msg::Navigate(View::Tasks)
        );
    }

    #[test]
    fn task_commands() {
        assert_eq!(
            msg("set 3 max_pages 5", Some(View::Tasks)),
            Msg::TaskDraftChanged {
                id: 3,
                field: DraftField::MaxPages,
                value: "5".to_string()
            }
        );
        assert_eq!(
            msg("set 3 keyword sony a7 iv", Some(View::Tasks)),
            Msg::TaskDraftChanged {
                id: 3,
                field: DraftField::Keyword,
                value: "sony a7 iv".to_string()
            }
        );
        assert_eq!(
            msg("set 3 max_price", Some(View::Tasks)),
            Msg::TaskDraftChanged {
                id: 3,
                field: DraftField::MaxPrice,
                value: String::new()
            }
        );
        assert_eq!(msg("save 3", Some(View::Tasks)), Msg::TaskEditSaved(3));
        assert_eq!(
            msg("halt 2", Some(View::Tasks)),
            Msg::TaskRunRequested {
                id: 2,
                action: RunAction::Stop
            }
        );
        assert!(parse("edit x", Some(View::Tasks)).is_err());
        assert!(parse("set 1 colour red", Some(View::Tasks)).is_err());
    }

    #[test]
    fn new_task_splits_on_semicolons() {
        let Msg::TaskCreateSubmitted(task) = msg(
            "new camera; a7c; full frame under budget; ; 9000",
            Some(View::Tasks),
        ) else {
            panic!("expected create");
        };
        assert_eq!(task.task_name, "camera");
        assert_eq!(task.description, "full frame under budget");
        assert_eq!(task.min_price, None);
        assert_eq!(task.max_price.as_deref(), Some("9000"));
        assert!(parse("new only-name", Some(View::Tasks)).is_err());
    }

    #[test]
    fn save_in_settings_saves_prompt() {
        assert_eq!(msg("save", Some(View::Settings)), Msg::PromptSaveClicked);
        assert_eq!(
            msg("text line one\\nline two", Some(View::Settings)),
            Msg::PromptEdited("line one\nline two".to_string())
        );
    }

    #[test]
    fn result_and_log_commands() {
        assert_eq!(
            msg("sort price asc", Some(View::Results)),
            Msg::ResultSortSet {
                by: SortBy::Price,
                order: SortOrder::Asc
            }
        );
        assert_eq!(
            msg("recommended on", Some(View::Results)),
            Msg::RecommendedOnlySet(true)
        );
        assert_eq!(
            msg("auto off", Some(View::Logs)),
            Msg::LogAutoRefreshSet(AutoRefresh::Off)
        );
        assert_eq!(
            msg("bottom", Some(View::Logs)),
            Msg::LogScrolled { top: usize::MAX }
        );
    }

    #[test]
    fn scraper_and_raw_record_commands() {
        assert_eq!(msg("status", None), Msg::ScraperStatusRequested);
        assert_eq!(
            msg("stop-all", Some(View::Logs)),
            Msg::ScraperRunRequested(RunAction::Stop)
        );
        assert_eq!(msg("json 3", Some(View::Results)), Msg::ResultJsonOpened(2));
        assert_eq!(msg("close", Some(View::Results)), Msg::ResultJsonClosed);
        assert!(parse("json 0", Some(View::Results)).is_err());
    }

    #[test]
    fn control_commands() {
        assert_eq!(parse("quit", None), Ok(Command::Quit));
        assert_eq!(parse("", None), Ok(Command::Show));
        assert!(parse("frobnicate", None).is_err());
    }
}
