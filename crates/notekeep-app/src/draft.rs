//! Form draft state for composing a note.

use std::sync::{Mutex, MutexGuard};

use notekeep_core::ImageFile;

/// Unsaved form state. Process-local; cleared only by a successful create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub name: String,
    pub description: String,
    pub file: Option<ImageFile>,
    /// A create is in flight; the submit control is disabled.
    pub creating: bool,
}

impl NoteDraft {
    /// Whether submitting would do anything: a non-blank title.
    pub fn has_title(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub(crate) fn clear_fields(&mut self) {
        self.name.clear();
        self.description.clear();
        self.file = None;
    }
}

/// Clears the draft's `creating` flag when dropped, so every exit path out
/// of a create (success, `?`, panic) re-enables the submit control.
pub(crate) struct CreatingGuard<'a> {
    draft: &'a Mutex<NoteDraft>,
}

impl<'a> CreatingGuard<'a> {
    pub(crate) fn begin(draft: &'a Mutex<NoteDraft>) -> Self {
        lock(draft).creating = true;
        Self { draft }
    }
}

impl Drop for CreatingGuard<'_> {
    fn drop(&mut self) {
        lock(self.draft).creating = false;
    }
}

/// Lock view state, recovering from poisoning; neither the draft nor the
/// error banner holds an invariant a panicking writer could break halfway.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_title_ignores_whitespace() {
        let mut draft = NoteDraft::default();
        assert!(!draft.has_title());
        draft.name = "   ".to_string();
        assert!(!draft.has_title());
        draft.name = " Trip ".to_string();
        assert!(draft.has_title());
    }

    #[test]
    fn test_clear_fields_keeps_busy_flag() {
        let mut draft = NoteDraft {
            name: "Trip".to_string(),
            description: "beach".to_string(),
            file: Some(ImageFile::new("beach.jpg", vec![1])),
            creating: true,
        };
        draft.clear_fields();
        assert_eq!(draft.name, "");
        assert_eq!(draft.description, "");
        assert!(draft.file.is_none());
        assert!(draft.creating);
    }

    #[test]
    fn test_guard_clears_flag_on_drop() {
        let draft = Mutex::new(NoteDraft::default());
        {
            let _guard = CreatingGuard::begin(&draft);
            assert!(lock(&draft).creating);
        }
        assert!(!lock(&draft).creating);
    }

    #[test]
    fn test_guard_clears_flag_on_early_return() {
        fn failing(draft: &Mutex<NoteDraft>, fail: bool) -> Result<(), &'static str> {
            let _guard = CreatingGuard::begin(draft);
            if fail {
                return Err("upload failed");
            }
            Ok(())
        }

        let draft = Mutex::new(NoteDraft::default());
        assert!(failing(&draft, true).is_err());
        assert!(!lock(&draft).creating);
    }

    #[test]
    fn test_lock_recovers_from_poison() {
        let banner = std::sync::Arc::new(Mutex::new(Some("old".to_string())));
        let poisoner = banner.clone();
        let _ = std::thread::spawn(move || {
            let _held = poisoner.lock().unwrap();
            panic!("writer died");
        })
        .join();

        assert!(banner.is_poisoned());
        *lock(&banner) = None;
        assert!(lock(&banner).is_none());
    }
}
