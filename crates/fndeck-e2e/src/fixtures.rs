//! Test data for apps and functions.

use rand::Rng;

const NAME_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of generated app names. Long enough that a collision with an app
/// already present on the server is vanishingly unlikely.
pub const RANDOM_NAME_LEN: usize = 30;

/// An app as the console presents it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDetails {
    /// The app name, which doubles as its route segment.
    pub name: String,
}

impl AppDetails {
    /// Creates details for a named app.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Creates an app with a random alphabetic name.
    ///
    /// Suites run against shared servers, so isolation is probabilistic:
    /// a fresh 30-letter name per run rather than any server-side namespace.
    pub fn random() -> Self {
        Self {
            name: random_letters(RANDOM_NAME_LEN),
        }
    }
}

/// A function's configurable fields.
///
/// `None` means "leave this field alone": an edit with `image: None` keeps
/// the current image, and a create without memory uses the server default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnDetails {
    /// The function name.
    pub name: String,

    /// Container image, e.g. `fndemouser/myFn`.
    pub image: Option<String>,

    /// Memory allocation in MB.
    pub memory: Option<u64>,
}

impl FnDetails {
    /// Creates details for a named function with no image or memory set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
            memory: None,
        }
    }

    /// Sets the container image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the memory allocation in MB.
    #[must_use]
    pub fn with_memory(mut self, memory: u64) -> Self {
        self.memory = Some(memory);
        self
    }
}

/// Generates a random string of ASCII letters.
fn random_letters(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..NAME_LETTERS.len());
            NAME_LETTERS[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_app_names_are_alphabetic_and_full_length() {
        let app = AppDetails::random();

        assert_eq!(app.name.len(), RANDOM_NAME_LEN);
        assert!(app.name.chars().all(|c| c.is_ascii_alphabetic()));
    }

    #[test]
    fn random_app_names_differ_between_runs() {
        // 52^30 possibilities; two equal draws would point at a broken RNG.
        assert_ne!(AppDetails::random().name, AppDetails::random().name);
    }

    #[test]
    fn fn_details_builder_sets_optional_fields() {
        let plain = FnDetails::new("myFn");
        assert_eq!(plain.image, None);
        assert_eq!(plain.memory, None);

        let full = FnDetails::new("myFn")
            .with_image("fndemouser/myFn")
            .with_memory(128);
        assert_eq!(full.image.as_deref(), Some("fndemouser/myFn"));
        assert_eq!(full.memory, Some(128));
    }
}
