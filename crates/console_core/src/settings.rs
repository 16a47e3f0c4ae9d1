use crate::model::{RemoteResult, SystemStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Loadable<T> {
    #[default]
    Loading,
    Ready(T),
    Failed,
}

impl<T> Loadable<T> {
    pub fn from_result<E>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Loadable::Ready(value),
            Err(_) => Loadable::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PromptEditor {
    #[default]
    Unselected,
    Loading,
    Editing { draft: String },
    Failed,
}

/// System status panel plus the prompt-template editor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsView {
    status: Loadable<SystemStatus>,
    prompts: Loadable<Vec<String>>,
    selected: Option<String>,
    editor: PromptEditor,
    saving: bool,
}

impl SettingsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &Loadable<SystemStatus> {
        &self.status
    }

    pub fn prompts(&self) -> &Loadable<Vec<String>> {
        &self.prompts
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn editor(&self) -> &PromptEditor {
        &self.editor
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn apply_status(&mut self, result: RemoteResult<SystemStatus>) {
        self.status = Loadable::from_result(result);
    }

    pub fn apply_prompt_list(&mut self, result: RemoteResult<Vec<String>>) {
        self.prompts = Loadable::from_result(result);
    }

    /// Selects a prompt file. Returns the file to load, if any.
    pub fn select(&mut self, filename: Option<String>) -> Option<String> {
        self.selected = filename.filter(|name| !name.trim().is_empty());
        self.editor = match self.selected {
            Some(_) => PromptEditor::Loading,
            None => PromptEditor::Unselected,
        };
        self.selected.clone()
    }

    /// Installs loaded content unless the operator picked another file since.
    pub fn apply_content(&mut self, filename: &str, result: RemoteResult<String>) -> bool {
        if self.selected.as_deref() != Some(filename) {
            return false;
        }
        self.editor = match result {
            Ok(draft) => PromptEditor::Editing { draft },
            Err(_) => PromptEditor::Failed,
        };
        true
    }

    pub fn edit(&mut self, text: String) -> bool {
        match &mut self.editor {
            PromptEditor::Editing { draft } => {
                *draft = text;
                true
            }
            _ => false,
        }
    }

    /// Starts a save. Returns `(filename, content)` to send, or `None` if
    /// there is nothing loaded or a save is already in flight.
    pub fn begin_save(&mut self) -> Option<(String, String)> {
        if self.saving {
            return None;
        }
        let filename = self.selected.clone()?;
        let PromptEditor::Editing { draft } = &self.editor else {
            return None;
        };
        self.saving = true;
        Some((filename, draft.clone()))
    }

    pub fn finish_save(&mut self) {
        self.saving = false;
    }
}
