//! Duplicate-file resolution
//!
//! Decides what happens to a source file whose identifier already has rows in
//! the destination table. The decision itself ([`decide`]) is pure; operator
//! interaction goes through the [`ConflictPrompt`] trait so the loop in
//! [`resolve`] can be driven by a terminal or by a script.

#[cfg(feature = "cli")]
pub mod prompt;

use crate::database::{DatabaseError, StoreGateway, TargetTable};
use crate::models::{LoadAction, PriorLoadInfo};

/// Whether an operator is available to answer conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Loaded files are skipped without asking
    NonInteractive,
    /// Loaded files need a confirmed operator choice
    Interactive,
}

impl ResolveMode {
    pub fn from_interactive(interactive: bool) -> Self {
        if interactive {
            ResolveMode::Interactive
        } else {
            ResolveMode::NonInteractive
        }
    }
}

/// Raw operator answer plus whether it was confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedChoice {
    pub input: String,
    pub confirmed: bool,
}

impl ConfirmedChoice {
    pub fn confirmed(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            confirmed: true,
        }
    }
}

/// Error during duplicate resolution
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("File is already loaded and no choice was given")]
    ChoiceRequired,
    #[error("Invalid choice '{0}': expected 1 (skip), 2 (replace) or 3 (append)")]
    InvalidChoice(String),
    #[error("Choice '{0}' was not confirmed")]
    NotConfirmed(String),
    #[error("Prompt failed: {0}")]
    PromptFailed(String),
}

/// Map an operator answer to an action: `1` skip, `2` replace, `3` append
pub fn parse_choice(input: &str) -> Result<LoadAction, ResolveError> {
    match input.trim() {
        "1" => Ok(LoadAction::Skip),
        "2" => Ok(LoadAction::Replace),
        "3" => Ok(LoadAction::Append),
        other => Err(ResolveError::InvalidChoice(other.to_string())),
    }
}

/// Look up what the store holds for `file_id`
///
/// Returns `None` when nothing is stored. A failing lookup is logged and
/// treated as "not loaded" so one unreachable check does not stop the run.
pub async fn check<B: StoreGateway + ?Sized>(
    store: &B,
    table: &TargetTable,
    file_id: &str,
) -> Option<PriorLoadInfo> {
    match store.check_loaded(table, file_id).await {
        Ok(info) if info.exists() => Some(info),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(
                "Could not check whether {} is already loaded, treating it as new: {}",
                file_id,
                e
            );
            None
        }
    }
}

/// Decide the action for a file
///
/// | prior   | mode            | provided            | result          |
/// |---------|-----------------|---------------------|-----------------|
/// | absent  | any             | ignored             | `Append`        |
/// | present | non-interactive | ignored             | `Skip`          |
/// | present | interactive     | confirmed `1/2/3`   | mapped action   |
/// | present | interactive     | anything else       | error           |
pub fn decide(
    prior: Option<&PriorLoadInfo>,
    mode: ResolveMode,
    provided: Option<&ConfirmedChoice>,
) -> Result<LoadAction, ResolveError> {
    let Some(prior) = prior.filter(|p| p.exists()) else {
        return Ok(LoadAction::Append);
    };

    match mode {
        ResolveMode::NonInteractive => {
            tracing::debug!("{} already loaded, skipping", prior.file_id);
            Ok(LoadAction::Skip)
        }
        ResolveMode::Interactive => {
            let choice = provided.ok_or(ResolveError::ChoiceRequired)?;
            let action = parse_choice(&choice.input)?;
            if !choice.confirmed {
                return Err(ResolveError::NotConfirmed(choice.input.clone()));
            }
            Ok(action)
        }
    }
}

/// Operator interaction for an already-loaded file
pub trait ConflictPrompt {
    /// Show what the store holds for the file
    fn show_prior(&mut self, prior: &PriorLoadInfo) -> Result<(), ResolveError>;

    /// Ask for a raw choice
    fn ask_choice(&mut self, file_id: &str) -> Result<String, ResolveError>;

    /// Tell the operator their input was not understood
    fn reject(&mut self, input: &str);

    /// Ask for a second confirmation of `action`
    fn confirm(&mut self, file_id: &str, action: LoadAction) -> Result<bool, ResolveError>;
}

/// Prompt for unattended runs; every question fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl ConflictPrompt for NoPrompt {
    fn show_prior(&mut self, _prior: &PriorLoadInfo) -> Result<(), ResolveError> {
        Ok(())
    }

    fn ask_choice(&mut self, _file_id: &str) -> Result<String, ResolveError> {
        Err(ResolveError::PromptFailed("no operator available".into()))
    }

    fn reject(&mut self, _input: &str) {}

    fn confirm(&mut self, _file_id: &str, _action: LoadAction) -> Result<bool, ResolveError> {
        Err(ResolveError::PromptFailed("no operator available".into()))
    }
}

/// Decide the action, asking the operator when needed
///
/// Invalid answers and refused confirmations re-prompt; a prompt failure is
/// returned as an error.
pub fn resolve(
    prior: Option<&PriorLoadInfo>,
    mode: ResolveMode,
    prompt: &mut dyn ConflictPrompt,
) -> Result<LoadAction, ResolveError> {
    let prior = prior.filter(|p| p.exists());
    let Some(info) = prior else {
        return decide(None, mode, None);
    };
    if mode == ResolveMode::NonInteractive {
        return decide(prior, mode, None);
    }

    prompt.show_prior(info)?;
    loop {
        let input = prompt.ask_choice(&info.file_id)?;
        let action = match parse_choice(&input) {
            Ok(action) => action,
            Err(_) => {
                prompt.reject(&input);
                continue;
            }
        };

        if prompt.confirm(&info.file_id, action)? {
            return decide(prior, mode, Some(&ConfirmedChoice::confirmed(input)));
        }
        tracing::debug!("{} not confirmed for {}, asking again", action, info.file_id);
    }
}

/// Carry out the store side of an action; returns the rows deleted
///
/// Only `Replace` touches the store: it removes every row of the file in a
/// single statement. `Append` on a loaded file keeps the old rows, so the
/// file ends up stored twice.
pub async fn apply<B: StoreGateway + ?Sized>(
    store: &B,
    table: &TargetTable,
    file_id: &str,
    action: LoadAction,
) -> Result<u64, DatabaseError> {
    match action {
        LoadAction::Replace => {
            let deleted = store.delete_by_file_id(table, file_id).await?;
            tracing::info!("Deleted {} existing rows for {}", deleted, file_id);
            Ok(deleted)
        }
        LoadAction::Skip | LoadAction::Append => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryBackend;
    use crate::models::CanonicalRow;
    use chrono::NaiveDate;
    use std::collections::VecDeque;

    fn prior(rows: u64) -> PriorLoadInfo {
        PriorLoadInfo {
            file_id: "a.xlsx".to_string(),
            row_count: rows,
            first_load_at: None,
            last_load_at: None,
            last_update_at: None,
            min_event_at: None,
            max_event_at: None,
        }
    }

    /// Prompt fed from canned answers
    struct Scripted {
        choices: VecDeque<&'static str>,
        confirms: VecDeque<bool>,
        shown: usize,
        rejected: Vec<String>,
    }

    impl Scripted {
        fn new(choices: &[&'static str], confirms: &[bool]) -> Self {
            Self {
                choices: choices.iter().copied().collect(),
                confirms: confirms.iter().copied().collect(),
                shown: 0,
                rejected: Vec::new(),
            }
        }
    }

    impl ConflictPrompt for Scripted {
        fn show_prior(&mut self, _prior: &PriorLoadInfo) -> Result<(), ResolveError> {
            self.shown += 1;
            Ok(())
        }

        fn ask_choice(&mut self, _file_id: &str) -> Result<String, ResolveError> {
            self.choices
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| ResolveError::PromptFailed("input closed".into()))
        }

        fn reject(&mut self, input: &str) {
            self.rejected.push(input.to_string());
        }

        fn confirm(&mut self, _file_id: &str, _action: LoadAction) -> Result<bool, ResolveError> {
            self.confirms
                .pop_front()
                .ok_or_else(|| ResolveError::PromptFailed("input closed".into()))
        }
    }

    #[test]
    fn test_decide_absent_appends() {
        for mode in [ResolveMode::NonInteractive, ResolveMode::Interactive] {
            assert_eq!(decide(None, mode, None).unwrap(), LoadAction::Append);
            assert_eq!(
                decide(Some(&prior(0)), mode, None).unwrap(),
                LoadAction::Append
            );
        }
    }

    #[test]
    fn test_decide_non_interactive_skips() {
        let choice = ConfirmedChoice::confirmed("2");
        assert_eq!(
            decide(Some(&prior(3)), ResolveMode::NonInteractive, Some(&choice)).unwrap(),
            LoadAction::Skip
        );
    }

    #[test]
    fn test_decide_interactive_choices() {
        let p = prior(3);
        for (input, expected) in [
            ("1", LoadAction::Skip),
            ("2", LoadAction::Replace),
            (" 3 ", LoadAction::Append),
        ] {
            let choice = ConfirmedChoice::confirmed(input);
            assert_eq!(
                decide(Some(&p), ResolveMode::Interactive, Some(&choice)).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn test_decide_interactive_never_defaults() {
        let p = prior(3);
        assert!(matches!(
            decide(Some(&p), ResolveMode::Interactive, None),
            Err(ResolveError::ChoiceRequired)
        ));
        assert!(matches!(
            decide(
                Some(&p),
                ResolveMode::Interactive,
                Some(&ConfirmedChoice::confirmed("4"))
            ),
            Err(ResolveError::InvalidChoice(_))
        ));
        let unconfirmed = ConfirmedChoice {
            input: "2".to_string(),
            confirmed: false,
        };
        assert!(matches!(
            decide(Some(&p), ResolveMode::Interactive, Some(&unconfirmed)),
            Err(ResolveError::NotConfirmed(_))
        ));
    }

    #[test]
    fn test_resolve_reprompts_until_confirmed() {
        let mut prompt = Scripted::new(&["x", "2", "3"], &[false, true]);
        let action = resolve(Some(&prior(5)), ResolveMode::Interactive, &mut prompt).unwrap();
        assert_eq!(action, LoadAction::Append);
        assert_eq!(prompt.shown, 1);
        assert_eq!(prompt.rejected, vec!["x".to_string()]);
    }

    #[test]
    fn test_resolve_prompt_failure_is_error() {
        let mut prompt = Scripted::new(&[], &[]);
        assert!(matches!(
            resolve(Some(&prior(5)), ResolveMode::Interactive, &mut prompt),
            Err(ResolveError::PromptFailed(_))
        ));
    }

    #[test]
    fn test_resolve_does_not_prompt_when_not_needed() {
        let mut prompt = Scripted::new(&[], &[]);
        assert_eq!(
            resolve(None, ResolveMode::Interactive, &mut prompt).unwrap(),
            LoadAction::Append
        );
        assert_eq!(
            resolve(Some(&prior(5)), ResolveMode::NonInteractive, &mut prompt).unwrap(),
            LoadAction::Skip
        );
        assert_eq!(prompt.shown, 0);
    }

    #[tokio::test]
    async fn test_check_and_apply_replace() {
        let store = MemoryBackend::new();
        let table = TargetTable::parse("Calidad_Transmision").unwrap();
        store.initialize(&table).await.unwrap();

        assert!(check(&store, &table, "a.xlsx").await.is_none());

        let open = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let rows = vec![CanonicalRow::new(open, "a.xlsx"); 4];
        store.bulk_insert(&table, &rows, 500).await.unwrap();

        let info = check(&store, &table, "a.xlsx").await.unwrap();
        assert_eq!(info.row_count, 4);

        assert_eq!(
            apply(&store, &table, "a.xlsx", LoadAction::Append).await.unwrap(),
            0
        );
        assert_eq!(
            apply(&store, &table, "a.xlsx", LoadAction::Replace).await.unwrap(),
            4
        );
        assert!(check(&store, &table, "a.xlsx").await.is_none());
    }

    #[tokio::test]
    async fn test_check_degrades_on_store_error() {
        let store = MemoryBackend::new();
        let table = TargetTable::parse("never_created").unwrap();
        assert!(check(&store, &table, "a.xlsx").await.is_none());
    }
}
