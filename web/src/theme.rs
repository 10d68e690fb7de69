use crate::utils::*;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const BODY_CLASS: &'static str = "dark";

    pub(crate) const fn toggled(self) -> Self {
        use Theme::*;
        match self {
            Light => Dark,
            Dark => Light,
        }
    }

    fn update_body(self) {
        let class_list = gloo::utils::body().class_list();
        let result = match self {
            Theme::Dark => class_list.add_1(Self::BODY_CLASS),
            Theme::Light => class_list.remove_1(Self::BODY_CLASS),
        };
        log::debug!("theme: {:?}", self);
        if let Err(err) = result {
            log::error!("failed to set theme: {:?}", err);
        }
    }

    pub(crate) fn init() -> Self {
        let theme = Self::local_or_default();
        theme.update_body();
        theme
    }

    pub(crate) fn apply(self) {
        self.local_save();
        self.update_body();
    }
}

impl StorageKey for Theme {
    const KEY: &'static str = "pokeflip:theme";
}
