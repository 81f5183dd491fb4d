use crate::config::Config;
use crate::context::Context;
use crate::error::{RenameError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::DateTime;
use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior, Value};
use regex::Regex;
use thiserror::Error as ThisError;

const DEFAULT_DATE_FORMAT: &str = "yyyyMMdd";

#[derive(Debug, Clone, ThisError)]
#[error("{0}")]
pub struct TemplateError(pub String);

/// Renders an output template against a file's context
pub trait Renderer {
    fn render(&self, template: &str, context: &Context) -> Result<String, TemplateError>;
}

/// `minijinja` environment with the built-in and user filters registered.
///
/// Built once per run and shared by every operation in the batch.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Engine with built-in filters only
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        register_builtin_filters(&mut env);
        Self { env }
    }

    /// Engine with built-in filters plus the config's `[filters]`.
    /// A user filter sharing a built-in's name replaces it.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut engine = Self::new();
        for (name, rule) in &config.filters {
            let re = Regex::new(&rule.pattern).map_err(|source| RenameError::InvalidRegex {
                pattern: rule.pattern.clone(),
                source,
            })?;
            let replacement = rule.replacement.clone();
            engine.env.add_filter(name.clone(), move |value: String| {
                re.replace_all(&value, replacement.as_str()).into_owned()
            });
        }
        Ok(engine)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TemplateEngine {
    fn render(&self, template: &str, context: &Context) -> Result<String, TemplateError> {
        self.env
            .render_str(template, context)
            .map_err(|e| TemplateError(format!("{:#}", e)))
    }
}

fn register_builtin_filters(env: &mut Environment<'static>) {
    env.add_filter("big", |value: String| value.to_uppercase());
    env.add_filter("little", |value: String| value.to_lowercase());
    env.add_filter("pascal", |value: String| pascal_case(&value));
    env.add_filter("camel", |value: String| camel_case(&value));
    env.add_filter("kebab", |value: String| joined_lower(&value, "-"));
    env.add_filter("snake", |value: String| joined_lower(&value, "_"));
    env.add_filter("date", date_filter);
    env.add_filter("match", match_filter);
    env.add_filter("regexReplace", regex_replace_filter);
    env.add_filter("padNumber", pad_number_filter);
}

/// Split an identifier-ish string into words: separators, lower→upper
/// transitions, acronym→word transitions and letter/digit boundaries.
pub fn split_words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(prev) = current.chars().last() {
            let next = chars.get(i + 1).copied();
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_alphabetic() != c.is_alphabetic())
                || (prev.is_uppercase()
                    && c.is_uppercase()
                    && next.is_some_and(char::is_lowercase));
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn pascal_case(value: &str) -> String {
    split_words(value).iter().map(|w| capitalize(w)).collect()
}

fn camel_case(value: &str) -> String {
    split_words(value)
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
        .collect()
}

fn joined_lower(value: &str, separator: &str) -> String {
    split_words(value)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}

/// `{{ date.modify | date("yyyy-MM-dd") }}`. Accepts date-fns style tokens
/// or a strftime string; unparseable input renders as "".
fn date_filter(value: String, format: Option<String>) -> String {
    let Ok(parsed) = DateTime::parse_from_rfc3339(&value) else {
        return String::new();
    };
    let format = format.unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
    let strftime = if format.contains('%') {
        format
    } else {
        date_tokens_to_strftime(&format)
    };
    if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
        return String::new();
    }
    parsed
        .format_with_items(StrftimeItems::new(&strftime))
        .to_string()
}

/// Translate `yyyyMMdd`-style tokens into strftime. Text inside single
/// quotes is literal.
pub fn date_tokens_to_strftime(format: &str) -> String {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            i += 1;
            while i < chars.len() && chars[i] != '\'' {
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }
        let spec = match (c, run) {
            ('y', 2) => Some("%y"),
            ('y', _) => Some("%Y"),
            ('M', 1) => Some("%-m"),
            ('M', 2) => Some("%m"),
            ('M', 3) => Some("%b"),
            ('M', _) => Some("%B"),
            ('d', 1) => Some("%-d"),
            ('d', _) => Some("%d"),
            ('H', 1) => Some("%-H"),
            ('H', _) => Some("%H"),
            ('h', 1) => Some("%-I"),
            ('h', _) => Some("%I"),
            ('m', 1) => Some("%-M"),
            ('m', _) => Some("%M"),
            ('s', 1) => Some("%-S"),
            ('s', _) => Some("%S"),
            ('a', _) => Some("%p"),
            ('E', 1..=3) => Some("%a"),
            ('E', _) => Some("%A"),
            _ => None,
        };
        match spec {
            Some(spec) => out.push_str(spec),
            None => {
                for _ in 0..run {
                    push_literal(&mut out, c);
                }
            },
        }
        i += run;
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn regex_with_flags(pattern: &str, flags: &str) -> Result<Regex, Error> {
    let inline: String = flags.chars().filter(|c| "imsx".contains(*c)).collect();
    let full = if inline.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{}){}", inline, pattern)
    };
    Regex::new(&full).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid regex `{}`: {}", pattern, e),
        )
    })
}

/// `{{ f | match("(\d+)", "i", 1) }}`: a capture group by index or name.
fn match_filter(
    value: String,
    pattern: String,
    flags: Option<String>,
    group: Option<Value>,
) -> Result<String, Error> {
    let re = regex_with_flags(&pattern, flags.as_deref().unwrap_or(""))?;
    let Some(captures) = re.captures(&value) else {
        return Ok(String::new());
    };
    let matched = match group {
        Some(g) if g.as_str().is_some() => captures.name(g.as_str().unwrap_or_default()),
        Some(g) => {
            let index = i64::try_from(g).unwrap_or(0);
            usize::try_from(index).ok().and_then(|i| captures.get(i))
        },
        None => captures.get(0),
    };
    Ok(matched.map_or_else(String::new, |m| m.as_str().to_string()))
}

/// `regexReplace(pattern, replacement)` or `regexReplace(pattern, flags,
/// replacement)`. Without the `g` flag only the first match is replaced.
fn regex_replace_filter(
    value: String,
    pattern: String,
    second: Option<String>,
    third: Option<String>,
) -> Result<String, Error> {
    if pattern.is_empty() {
        return Ok(value);
    }
    let (flags, replacement) = match (second, third) {
        (Some(flags), Some(replacement)) => (flags, replacement),
        (Some(only), None) if is_flag_string(&only) => (only, String::new()),
        (Some(replacement), None) => (String::new(), replacement),
        (None, _) => (String::new(), String::new()),
    };
    let re = regex_with_flags(&pattern, &flags)?;
    let replaced = if flags.contains('g') {
        re.replace_all(&value, replacement.as_str())
    } else {
        re.replace(&value, replacement.as_str())
    };
    Ok(replaced.into_owned())
}

fn is_flag_string(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| "gimsuy".contains(c))
}

/// `{{ n | padNumber(3) }}` or `{{ n | padNumber("000") }}`
fn pad_number_filter(value: Value, length: Value) -> String {
    let text = value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string);
    let width = match length.as_str() {
        Some(s) => s.chars().count(),
        None => i64::try_from(length)
            .ok()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0),
    };
    let len = text.chars().count();
    if len >= width {
        text
    } else {
        format!("{}{}", "0".repeat(width - len), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterRule;
    use serde_json::json;

    fn ctx(value: serde_json::Value) -> Context {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("context must be an object"),
        }
    }

    fn render(template: &str, value: serde_json::Value) -> String {
        TemplateEngine::new().render(template, &ctx(value)).unwrap()
    }

    #[test]
    fn test_plain_variables() {
        assert_eq!(
            render("{{p}}-{{f}}", json!({"p": "photos", "f": "beach"})),
            "photos-beach"
        );
    }

    #[test]
    fn test_undefined_variable_is_error() {
        let result = TemplateEngine::new().render("{{nope}}", &Context::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_syntax_is_error() {
        let result = TemplateEngine::new().render("{{ f | }}", &ctx(json!({"f": "a"})));
        assert!(result.is_err());
    }

    #[test]
    fn test_case_filters() {
        let c = json!({"f": "my holiday-photoHTTPServer"});
        assert_eq!(render("{{f|big}}", json!({"f": "abc"})), "ABC");
        assert_eq!(render("{{f|little}}", json!({"f": "AbC"})), "abc");
        assert_eq!(render("{{f|pascal}}", c.clone()), "MyHolidayPhotoHttpServer");
        assert_eq!(render("{{f|camel}}", c.clone()), "myHolidayPhotoHttpServer");
        assert_eq!(render("{{f|kebab}}", c.clone()), "my-holiday-photo-http-server");
        assert_eq!(render("{{f|snake}}", c), "my_holiday_photo_http_server");
    }

    #[test]
    fn test_split_words_digits() {
        assert_eq!(split_words("track12Name"), vec!["track", "12", "Name"]);
        assert_eq!(split_words("--"), Vec::<String>::new());
    }

    #[test]
    fn test_date_filter() {
        let c = json!({"d": "2021-03-04T05:06:07+00:00"});
        assert_eq!(render("{{d|date}}", c.clone()), "20210304");
        assert_eq!(render("{{d|date('yyyy-MM-dd HH.mm')}}", c.clone()), "2021-03-04 05.06");
        assert_eq!(render("{{d|date('%Y_%m')}}", c.clone()), "2021_03");
        assert_eq!(render("{{d|date(\"'week' d\")}}", c), "week 4");
        assert_eq!(render("{{d|date}}", json!({"d": ""})), "");
    }

    #[test]
    fn test_match_filter() {
        let c = json!({"f": "IMG_2041_final"});
        assert_eq!(render(r"{{f|match('\\d+')}}", c.clone()), "2041");
        assert_eq!(render(r"{{f|match('img_(\\d+)', 'i', 1)}}", c.clone()), "2041");
        assert_eq!(render(r"{{f|match('(?P<n>\\d+)', '', 'n')}}", c.clone()), "2041");
        assert_eq!(render(r"{{f|match('zzz')}}", c), "");
    }

    #[test]
    fn test_regex_replace_filter() {
        let c = json!({"f": "a b  c"});
        assert_eq!(render(r"{{f|regexReplace('\\s+', '-')}}", c.clone()), "a-b  c");
        assert_eq!(render(r"{{f|regexReplace('\\s+', 'g', '-')}}", c.clone()), "a-b-c");
        assert_eq!(render(r"{{f|regexReplace('\\s+', 'g')}}", c), "abc");
    }

    #[test]
    fn test_pad_number_filter() {
        assert_eq!(render("{{n|padNumber(3)}}", json!({"n": "7"})), "007");
        assert_eq!(render("{{n|padNumber('0000')}}", json!({"n": 42})), "0042");
        assert_eq!(render("{{n|padNumber(1)}}", json!({"n": "123"})), "123");
    }

    #[test]
    fn test_user_filters_from_config() {
        let mut config = Config::default();
        config.filters.insert(
            "dashes".to_string(),
            FilterRule {
                pattern: r"\s+".to_string(),
                replacement: "-".to_string(),
            },
        );
        config.filters.insert(
            "big".to_string(),
            FilterRule {
                pattern: "a".to_string(),
                replacement: "A".to_string(),
            },
        );
        let engine = TemplateEngine::from_config(&config).unwrap();
        let c = ctx(json!({"f": "a b  c"}));
        assert_eq!(engine.render("{{f|dashes}}", &c).unwrap(), "a-b-c");
        assert_eq!(engine.render("{{f|big}}", &c).unwrap(), "A b  c");
    }

    #[test]
    fn test_user_filter_bad_pattern() {
        let mut config = Config::default();
        config.filters.insert(
            "bad".to_string(),
            FilterRule {
                pattern: "[".to_string(),
                replacement: String::new(),
            },
        );
        assert!(TemplateEngine::from_config(&config).is_err());
    }

    #[test]
    fn test_date_tokens() {
        assert_eq!(date_tokens_to_strftime("yyyyMMdd"), "%Y%m%d");
        assert_eq!(date_tokens_to_strftime("yy-M-d"), "%y-%-m-%-d");
        assert_eq!(date_tokens_to_strftime("100%"), "100%%");
    }
}
