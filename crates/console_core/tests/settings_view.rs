use std::sync::Once;

use console_core::{
    update, AppState, Effect, Loadable, Msg, PaneView, PromptEditor, RemoteError, SettingsPane,
    SystemStatus, View,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(console_logging::initialize_for_tests);
}

fn pane(state: &AppState) -> SettingsPane {
    match state.view().pane {
        PaneView::Settings(pane) => pane,
        other => panic!("settings pane expected, got {other:?}"),
    }
}

fn opened() -> AppState {
    let (state, _) = update(AppState::new(), Msg::Navigate(View::Settings));
    let generation = state.session().generation();
    let (state, _) = update(
        state,
        Msg::StatusLoaded {
            generation,
            result: Ok(SystemStatus {
                scraper_running: true,
                ..SystemStatus::default()
            }),
        },
    );
    let (state, _) = update(
        state,
        Msg::PromptsListed {
            generation,
            result: Ok(vec!["base_prompt.txt".to_string(), "macbook_criteria.txt".to_string()]),
        },
    );
    state
}

fn load(state: AppState, filename: &str, content: &str) -> AppState {
    let generation = state.session().generation();
    update(
        state,
        Msg::PromptLoaded {
            generation,
            filename: filename.to_string(),
            result: Ok(content.to_string()),
        },
    )
    .0
}

#[test]
fn status_and_prompt_list_render() {
    init_logging();
    let pane = pane(&opened());
    assert!(matches!(pane.status, Loadable::Ready(SystemStatus { scraper_running: true, .. })));
    assert_eq!(
        pane.prompts,
        Loadable::Ready(vec![
            "base_prompt.txt".to_string(),
            "macbook_criteria.txt".to_string()
        ])
    );
    assert_eq!(pane.editor, PromptEditor::Unselected);
}

#[test]
fn late_content_for_previous_selection_is_dropped() {
    init_logging();
    let state = opened();
    let (state, effects) = update(state, Msg::PromptSelected(Some("base_prompt.txt".to_string())));
    assert!(matches!(effects.as_slice(), [Effect::LoadPrompt { filename, .. }] if filename == "base_prompt.txt"));
    let (state, _) = update(
        state,
        Msg::PromptSelected(Some("macbook_criteria.txt".to_string())),
    );

    let state = load(state, "base_prompt.txt", "old text");
    assert_eq!(pane(&state).editor, PromptEditor::Loading);
    let state = load(state, "macbook_criteria.txt", "criteria");
    assert_eq!(
        pane(&state).editor,
        PromptEditor::Editing {
            draft: "criteria".to_string()
        }
    );
}

#[test]
fn save_sends_edited_draft_once() {
    init_logging();
    let state = opened();
    let (state, _) = update(state, Msg::PromptSelected(Some("base_prompt.txt".to_string())));
    let state = load(state, "base_prompt.txt", "v1");
    let (state, _) = update(state, Msg::PromptEdited("v2".to_string()));
    let (state, effects) = update(state, Msg::PromptSaveClicked);
    let generation = state.session().generation();
    assert_eq!(
        effects,
        vec![Effect::SavePrompt {
            generation,
            filename: "base_prompt.txt".to_string(),
            content: "v2".to_string(),
        }]
    );
    assert!(pane(&state).saving);

    let (state, effects) = update(state, Msg::PromptSaveClicked);
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::PromptSaved {
            generation,
            filename: "base_prompt.txt".to_string(),
            result: Err(RemoteError::Status {
                code: 400,
                detail: Some("prompt too long".to_string()),
            }),
        },
    );
    assert!(!pane(&state).saving);
    let texts: Vec<_> = state.notifications().map(|n| n.text.as_str()).collect();
    assert_eq!(texts, vec!["prompt too long"]);
}

#[test]
fn save_without_selection_notifies() {
    init_logging();
    let (state, effects) = update(opened(), Msg::PromptSaveClicked);
    assert!(effects.is_empty());
    assert_eq!(state.notifications().count(), 1);
}
