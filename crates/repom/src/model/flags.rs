//! Model Flags - Per-model switches for convention columns
//!
//! A model's flags decide which convention columns the schema builder
//! attaches: the auto-increment `id` key and the `created_at` /
//! `updated_at` timestamps. Flags are plain values; a derived model states
//! its parent's flags and the overrides it applies, nothing is inherited
//! implicitly.

use serde::{Deserialize, Serialize};

/// Convention switches for a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelFlags {
    /// Attach an auto-increment integer primary key named `id`
    pub use_id: bool,
    /// Attach a `created_at` timestamp column
    pub use_created_at: bool,
    /// Attach an `updated_at` timestamp column
    pub use_updated_at: bool,
    /// The model declares its own (composite) key; never attach `id`
    pub use_composite_pk: bool,
}

impl ModelFlags {
    /// Defaults of the plain base model: an `id` key, no timestamps
    pub const BASE: ModelFlags = ModelFlags {
        use_id: true,
        use_created_at: false,
        use_updated_at: false,
        use_composite_pk: false,
    };

    /// Defaults of the opt-in base model: nothing is attached until the
    /// model asks for it
    pub const AUTO: ModelFlags = ModelFlags {
        use_id: false,
        use_created_at: false,
        use_updated_at: false,
        use_composite_pk: false,
    };

    pub const fn with_id(mut self, use_id: bool) -> Self {
        self.use_id = use_id;
        self
    }

    pub const fn with_created_at(mut self, use_created_at: bool) -> Self {
        self.use_created_at = use_created_at;
        self
    }

    pub const fn with_updated_at(mut self, use_updated_at: bool) -> Self {
        self.use_updated_at = use_updated_at;
        self
    }

    /// Enable both timestamp columns
    pub const fn with_timestamps(self) -> Self {
        self.with_created_at(true).with_updated_at(true)
    }

    /// Mark the model as composite-keyed
    pub const fn composite_pk(mut self) -> Self {
        self.use_composite_pk = true;
        self
    }

    /// Resolve a derived model's flags: every override that is set wins,
    /// every other field keeps the parent's value.
    pub const fn inherit(self, overrides: FlagOverrides) -> Self {
        ModelFlags {
            use_id: pick(overrides.use_id, self.use_id),
            use_created_at: pick(overrides.use_created_at, self.use_created_at),
            use_updated_at: pick(overrides.use_updated_at, self.use_updated_at),
            use_composite_pk: pick(overrides.use_composite_pk, self.use_composite_pk),
        }
    }

    /// Whether the schema builder attaches the `id` column.
    ///
    /// `use_composite_pk` takes precedence over `use_id`.
    pub const fn attaches_id(&self) -> bool {
        self.use_id && !self.use_composite_pk
    }
}

impl Default for ModelFlags {
    fn default() -> Self {
        ModelFlags::BASE
    }
}

/// Partial flag set applied on top of a parent's flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagOverrides {
    pub use_id: Option<bool>,
    pub use_created_at: Option<bool>,
    pub use_updated_at: Option<bool>,
    pub use_composite_pk: Option<bool>,
}

impl FlagOverrides {
    pub const NONE: FlagOverrides = FlagOverrides {
        use_id: None,
        use_created_at: None,
        use_updated_at: None,
        use_composite_pk: None,
    };
}

const fn pick(value: Option<bool>, fallback: bool) -> bool {
    match value {
        Some(v) => v,
        None => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_flags_are_all_off() {
        let flags = ModelFlags::AUTO;
        assert!(!flags.use_id);
        assert!(!flags.use_created_at);
        assert!(!flags.use_updated_at);
        assert!(!flags.use_composite_pk);
    }

    #[test]
    fn test_inherit_keeps_parent_values_for_unset_overrides() {
        let parent = ModelFlags::BASE.with_timestamps();
        let child = parent.inherit(FlagOverrides {
            use_updated_at: Some(false),
            ..FlagOverrides::NONE
        });
        assert!(child.use_id);
        assert!(child.use_created_at);
        assert!(!child.use_updated_at);
        assert_eq!(parent.inherit(FlagOverrides::default()), parent);
    }

    #[test]
    fn test_composite_pk_wins_over_inherited_id() {
        // The parent's `use_id = true` is still inherited; attaching is what
        // the composite flag suppresses.
        let child = ModelFlags::BASE.inherit(FlagOverrides {
            use_composite_pk: Some(true),
            ..FlagOverrides::NONE
        });
        assert!(child.use_id);
        assert!(!child.attaches_id());
        assert!(ModelFlags::BASE.attaches_id());
        assert!(!ModelFlags::AUTO.attaches_id());
    }

    #[test]
    fn test_const_builders() {
        const AUDITED: ModelFlags = ModelFlags::AUTO.with_id(true).with_created_at(true);
        assert!(AUDITED.use_id);
        assert!(AUDITED.use_created_at);
        assert!(!AUDITED.use_updated_at);
    }
}
