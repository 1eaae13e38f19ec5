//! UI strings in Korean, English, Japanese and Chinese.
//!
//! Tables are JSON files embedded at compile time and parsed once. Lookups
//! fall back from the requested language to English, then to the key.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ko,
    En,
    Ja,
    Zh,
}

impl Lang {
    pub const ALL: [Lang; 4] = [Lang::Ko, Lang::En, Lang::Ja, Lang::Zh];

    pub fn code(self) -> &'static str {
        match self {
            Lang::Ko => "ko",
            Lang::En => "en",
            Lang::Ja => "ja",
            Lang::Zh => "zh",
        }
    }

    /// Language of a POSIX locale name such as `ja_JP.UTF-8` or `en-US`.
    /// `C`, `POSIX` and unsupported languages give `None`.
    pub fn from_locale(locale: &str) -> Option<Lang> {
        let code = locale.split(['_', '-', '.', '@']).next()?;
        code.parse().ok()
    }

    /// Name of the language in itself, for a language switcher.
    pub fn label(self) -> &'static str {
        match self {
            Lang::Ko => "한국어",
            Lang::En => "English",
            Lang::Ja => "日本語",
            Lang::Zh => "中文",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ko" => Ok(Lang::Ko),
            "en" => Ok(Lang::En),
            "ja" => Ok(Lang::Ja),
            "zh" => Ok(Lang::Zh),
            other => Err(Error::Config(format!("unsupported language '{other}'"))),
        }
    }
}

type Table = HashMap<String, String>;

/// String tables for every language.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashMap<Lang, Table>,
}

impl Catalog {
    pub fn from_json(sources: &[(Lang, &str)]) -> Result<Self> {
        let mut tables = HashMap::new();
        for (lang, json) in sources {
            tables.insert(*lang, serde_json::from_str::<Table>(json)?);
        }
        Ok(Self { tables })
    }

    fn lookup(&self, lang: Lang, key: &str) -> Option<&str> {
        self.tables
            .get(&lang)
            .and_then(|t| t.get(key))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn t<'a>(&'a self, lang: Lang, key: &'a str) -> &'a str {
        self.lookup(lang, key)
            .or_else(|| self.lookup(Lang::En, key))
            .unwrap_or(key)
    }
}

fn builtin() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        Catalog::from_json(&[
            (Lang::Ko, include_str!("../locales/ko.json")),
            (Lang::En, include_str!("../locales/en.json")),
            (Lang::Ja, include_str!("../locales/ja.json")),
            (Lang::Zh, include_str!("../locales/zh.json")),
        ])
        .unwrap_or_else(|e| {
            log::error!("Embedded locale tables are invalid: {e}");
            Catalog::default()
        })
    })
}

/// Locale of the process: `LC_ALL`, then `LC_MESSAGES`, then `LANG`. The
/// first one set to a non-empty value wins.
pub fn process_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
}

/// Translate `key` with the built-in tables.
pub fn t<'a>(lang: Lang, key: &'a str) -> &'a str {
    builtin().t(lang, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables() {
        assert_eq!(t(Lang::En, "save"), "Save");
        assert_eq!(t(Lang::Ko, "save"), "저장");
        assert_eq!(t(Lang::default(), "pdf_download"), "PDF 다운로드");
    }

    #[test]
    fn every_language_has_every_english_key() {
        let catalog = builtin();
        for key in catalog.tables[&Lang::En].keys() {
            for lang in Lang::ALL {
                assert!(catalog.lookup(lang, key).is_some(), "{lang} lacks {key}");
            }
        }
    }

    #[test]
    fn falls_back_to_english_then_key() {
        let catalog = Catalog::from_json(&[
            (Lang::En, r#"{"save": "Save", "cancel": "Cancel"}"#),
            (Lang::Ja, r#"{"save": "保存", "cancel": ""}"#),
        ])
        .unwrap();
        assert_eq!(catalog.t(Lang::Ja, "save"), "保存");
        assert_eq!(catalog.t(Lang::Ja, "cancel"), "Cancel");
        assert_eq!(catalog.t(Lang::Zh, "save"), "Save");
        assert_eq!(catalog.t(Lang::Ja, "missing_key"), "missing_key");
    }

    #[test]
    fn unknown_key_returns_key() {
        assert_eq!(t(Lang::Zh, "no_such_key"), "no_such_key");
    }

    #[test]
    fn locale_names_map_to_languages() {
        assert_eq!(Lang::from_locale("ja_JP.UTF-8"), Some(Lang::Ja));
        assert_eq!(Lang::from_locale("zh_CN"), Some(Lang::Zh));
        assert_eq!(Lang::from_locale("en-US"), Some(Lang::En));
        assert_eq!(Lang::from_locale("ko"), Some(Lang::Ko));
        assert_eq!(Lang::from_locale("de_DE@euro"), None);
        assert_eq!(Lang::from_locale("C"), None);
        assert_eq!(Lang::from_locale(""), None);
    }

    #[test]
    fn parse_codes() {
        assert_eq!("JA".parse::<Lang>().unwrap(), Lang::Ja);
        assert!("fr".parse::<Lang>().is_err());
        assert_eq!(serde_json::to_string(&Lang::Zh).unwrap(), r#""zh""#);
    }
}
