//! Language classification: the `Language` dispatch key lives in
//! [`crate::core::model`]; this module provides extension-based lookup and
//! the full repository-level detector (C2).

pub mod detector;

pub use detector::{detect_languages, file_extension_inventory, DetectedLanguage};

use crate::core::model::Language;

/// Map a lowercase file extension (no leading dot) to a language tag, or
/// `None` if the extension is not recognized.
pub fn language_for_extension(ext: &str) -> Option<Language> {
    match ext {
        "java" => Some(Language::Java),
        "py" | "pyi" => Some(Language::Python),
        "js" | "mjs" | "jsx" | "cjs" => Some(Language::Javascript),
        "ts" | "tsx" => Some(Language::Typescript),
        "cs" => Some(Language::Csharp),
        "csproj" | "fsproj" | "vbproj" => Some(Language::Dotnet),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_extensions() {
        assert_eq!(language_for_extension("py"), Some(Language::Python));
        assert_eq!(language_for_extension("tsx"), Some(Language::Typescript));
        assert_eq!(language_for_extension("md"), None);
    }
}
