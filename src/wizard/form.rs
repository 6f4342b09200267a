use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::error::{DeployError, DeployResult};

/// HTTP method a form is submitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// Any value-carrying `<input>`: text, password, hidden,
    /// email, number...
    Input,
    Checkbox,
    Radio,
    Select,
    TextArea,
    Submit,
}

/// One named control of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub name: String,
    pub kind: ControlKind,
    pub value: String,
    pub checked: bool,
    pub disabled: bool,
    /// Option values of a `<select>`.
    pub options: Vec<String>,
}

/// A parsed HTML form whose fields can be filled in before
/// submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub name: String,
    pub action: Option<String>,
    pub method: Method,
    pub controls: Vec<Control>,
}

/// What a browser sends when a form is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub method: Method,
    pub url: String,
    pub fields: Vec<(String, String)>,
}

/// A fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Final URL, after redirects.
    pub url: String,
    pub body: String,
}

impl Page {
    #[must_use]
    pub fn new(url: &str, body: &str) -> Self {
        Self {
            url: url.to_string(),
            body: body.to_string(),
        }
    }

    /// The form with `name="{name}"`.
    pub fn form(&self, name: &str) -> DeployResult<Form> {
        parse_forms(&self.body)
            .into_iter()
            .find(|f| f.name == name)
            .ok_or_else(|| DeployError::FormNotFound(name.to_string()))
    }
}

/// Parse every form of an HTML document. Unnamed forms get an
/// empty name.
#[must_use]
pub fn parse_forms(html: &str) -> Vec<Form> {
    let document = Html::parse_document(html);
    let form_selector = Selector::parse("form").expect("valid selector");
    let control_selector =
        Selector::parse("input, select, textarea, button").expect("valid selector");

    document
        .select(&form_selector)
        .map(|form| {
            let el = form.value();
            let method = match el.attr("method") {
                Some(m) if m.eq_ignore_ascii_case("post") => Method::Post,
                _ => Method::Get,
            };
            Form {
                name: el.attr("name").unwrap_or_default().to_string(),
                action: el.attr("action").map(str::to_string),
                method,
                controls: form
                    .select(&control_selector)
                    .filter_map(parse_control)
                    .collect(),
            }
        })
        .collect()
}

fn parse_control(element: ElementRef<'_>) -> Option<Control> {
    let el = element.value();
    let name = el.attr("name")?.to_string();
    let disabled = el.attr("disabled").is_some();

    let control = match el.name() {
        "select" => {
            let option_selector = Selector::parse("option").expect("valid selector");
            let mut options = Vec::new();
            let mut selected = None;
            for option in element.select(&option_selector) {
                let value = option.value().attr("value").map_or_else(
                    || option.text().collect::<String>().trim().to_string(),
                    str::to_string,
                );
                if selected.is_none() && option.value().attr("selected").is_some() {
                    selected = Some(value.clone());
                }
                options.push(value);
            }
            let value = selected.or_else(|| options.first().cloned()).unwrap_or_default();
            Control {
                name,
                kind: ControlKind::Select,
                value,
                checked: false,
                disabled,
                options,
            }
        }
        "textarea" => Control {
            name,
            kind: ControlKind::TextArea,
            value: element.text().collect(),
            checked: false,
            disabled,
            options: Vec::new(),
        },
        "button" => {
            let kind = el.attr("type").unwrap_or("submit");
            if !kind.eq_ignore_ascii_case("submit") {
                return None;
            }
            Control {
                name,
                kind: ControlKind::Submit,
                value: el.attr("value").unwrap_or_default().to_string(),
                checked: false,
                disabled,
                options: Vec::new(),
            }
        }
        _ => {
            let kind = match el.attr("type").map(str::to_ascii_lowercase).as_deref() {
                Some("checkbox") => ControlKind::Checkbox,
                Some("radio") => ControlKind::Radio,
                Some("submit") => ControlKind::Submit,
                Some("button" | "reset" | "image" | "file") => return None,
                _ => ControlKind::Input,
            };
            let default_value = match kind {
                ControlKind::Checkbox | ControlKind::Radio => "on",
                _ => "",
            };
            Control {
                name,
                kind,
                value: el.attr("value").unwrap_or(default_value).to_string(),
                checked: el.attr("checked").is_some(),
                disabled,
                options: Vec::new(),
            }
        }
    };
    Some(control)
}

impl Form {
    fn field_not_found(&self, field: &str) -> DeployError {
        DeployError::FieldNotFound {
            form: self.name.clone(),
            field: field.to_string(),
        }
    }

    /// Whether the form has a control called `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.controls.iter().any(|c| c.name == field)
    }

    /// Set the value of a text-like field, or pick an option of a
    /// select or radio group.
    pub fn set(&mut self, field: &str, value: &str) -> DeployResult<()> {
        let form_name = self.name.clone();
        let first = self
            .controls
            .iter()
            .position(|c| c.name == field)
            .ok_or_else(|| self.field_not_found(field))?;

        match self.controls[first].kind {
            ControlKind::Input | ControlKind::TextArea => {
                self.controls[first].value = value.to_string();
                Ok(())
            }
            ControlKind::Select => {
                let control = &mut self.controls[first];
                if !control.options.iter().any(|o| o == value) {
                    return Err(DeployError::OptionNotFound {
                        field: field.to_string(),
                        value: value.to_string(),
                    });
                }
                control.value = value.to_string();
                Ok(())
            }
            ControlKind::Radio => {
                let mut found = false;
                for control in self.controls.iter_mut().filter(|c| c.name == field) {
                    control.checked = control.value == value;
                    found |= control.checked;
                }
                if found {
                    Ok(())
                } else {
                    Err(DeployError::OptionNotFound {
                        field: field.to_string(),
                        value: value.to_string(),
                    })
                }
            }
            ControlKind::Checkbox | ControlKind::Submit => Err(DeployError::Other(format!(
                "field '{field}' in form '{form_name}' is not a text or choice field"
            ))),
        }
    }

    /// Tick or untick a checkbox.
    pub fn set_checked(&mut self, field: &str, checked: bool) -> DeployResult<()> {
        let control = self
            .controls
            .iter()
            .position(|c| c.name == field && c.kind == ControlKind::Checkbox)
            .ok_or_else(|| self.field_not_found(field))?;
        self.controls[control].checked = checked;
        Ok(())
    }

    /// Current value of the first control called `field`.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&str> {
        self.controls
            .iter()
            .find(|c| c.name == field)
            .map(|c| c.value.as_str())
    }

    /// Name/value pairs sent on submit, in document order. The
    /// first named submit button counts as clicked.
    #[must_use]
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut clicked = false;
        self.controls
            .iter()
            .filter(|c| !c.disabled)
            .filter(|c| match c.kind {
                ControlKind::Checkbox | ControlKind::Radio => c.checked,
                ControlKind::Select => !c.options.is_empty(),
                ControlKind::Submit => !std::mem::replace(&mut clicked, true),
                ControlKind::Input | ControlKind::TextArea => true,
            })
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect()
    }

    /// Build the request submitting this form from `page_url`.
    pub fn submission(&self, page_url: &str) -> DeployResult<Submission> {
        let base = Url::parse(page_url).map_err(|e| DeployError::InvalidUrl(format!("{page_url}: {e}")))?;
        let url = match self.action.as_deref() {
            Some(action) if !action.trim().is_empty() => base
                .join(action.trim())
                .map_err(|e| DeployError::InvalidUrl(format!("{action}: {e}")))?,
            _ => base,
        };

        Ok(Submission {
            method: self.method,
            url: url.to_string(),
            fields: self.fields(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<form name="search"><input name="q"></form>
<form name="login" method="POST" action="?action=login">
  <input type="hidden" name="token" value="abc">
  <input type="text" name="user" value="guest">
  <input type="password" name="password">
  <input type="checkbox" name="remember" checked>
  <input type="checkbox" name="newsletter" value="yes">
  <input type="radio" name="lang" value="en" checked>
  <input type="radio" name="lang" value="fr">
  <select name="zone">
    <option value="UTC">UTC</option>
    <option value="Europe/Paris" selected>Paris</option>
  </select>
  <textarea name="notes">hello</textarea>
  <input type="text" name="locked" value="x" disabled>
  <input type="submit" name="go" value="Next">
  <input type="submit" name="other" value="Skip">
  <input type="reset" name="reset">
</form>
</body></html>"#;

    fn login() -> Form {
        Page::new("http://h/index.php", PAGE).form("login").unwrap()
    }

    #[test]
    fn parses_method_and_action() {
        let forms = parse_forms(PAGE);

        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].method, Method::Get);
        assert_eq!(forms[1].method, Method::Post);
        assert_eq!(forms[1].action.as_deref(), Some("?action=login"));
    }

    #[test]
    fn default_values() {
        let form = login();

        assert_eq!(form.value("token"), Some("abc"));
        assert_eq!(form.value("user"), Some("guest"));
        assert_eq!(form.value("zone"), Some("Europe/Paris"));
        assert_eq!(form.value("notes"), Some("hello"));
        assert_eq!(form.value("remember"), Some("on"));
        assert!(!form.has_field("reset"));
    }

    #[test]
    fn default_submission_fields() {
        let fields = login().fields();

        assert_eq!(
            fields,
            vec![
                ("token".to_string(), "abc".to_string()),
                ("user".to_string(), "guest".to_string()),
                ("password".to_string(), String::new()),
                ("remember".to_string(), "on".to_string()),
                ("lang".to_string(), "en".to_string()),
                ("zone".to_string(), "Europe/Paris".to_string()),
                ("notes".to_string(), "hello".to_string()),
                ("go".to_string(), "Next".to_string()),
            ]
        );
    }

    #[test]
    fn filled_fields() {
        let mut form = login();
        form.set("user", "admin").unwrap();
        form.set("zone", "UTC").unwrap();
        form.set("lang", "fr").unwrap();
        form.set_checked("remember", false).unwrap();
        form.set_checked("newsletter", true).unwrap();

        let fields = form.fields();

        assert!(fields.contains(&("user".into(), "admin".into())));
        assert!(fields.contains(&("zone".into(), "UTC".into())));
        assert!(fields.contains(&("lang".into(), "fr".into())));
        assert!(fields.contains(&("newsletter".into(), "yes".into())));
        assert!(!fields.iter().any(|(k, _)| k == "remember"));
    }

    #[test]
    fn unknown_field_fails() {
        let mut form = login();

        let err = form.set("nope", "x").unwrap_err();
        assert!(matches!(
            err,
            DeployError::FieldNotFound { ref form, ref field } if form == "login" && field == "nope"
        ));
    }

    #[test]
    fn unknown_option_fails() {
        let mut form = login();

        assert!(matches!(
            form.set("zone", "Mars/Olympus"),
            Err(DeployError::OptionNotFound { .. })
        ));
        assert!(matches!(
            form.set("lang", "de"),
            Err(DeployError::OptionNotFound { .. })
        ));
    }

    #[test]
    fn missing_form_fails() {
        let page = Page::new("http://h/", PAGE);

        assert!(matches!(
            page.form("register"),
            Err(DeployError::FormNotFound(ref n)) if n == "register"
        ));
    }

    #[test]
    fn submission_resolves_action() {
        let submission = login().submission("http://h/piwik/index.php?action=x").unwrap();

        assert_eq!(submission.method, Method::Post);
        assert_eq!(submission.url, "http://h/piwik/index.php?action=login");
    }

    #[test]
    fn submission_without_action_targets_page() {
        let form = Page::new("http://h/", PAGE).form("search").unwrap();

        let submission = form.submission("http://h/index.php?a=1").unwrap();
        assert_eq!(submission.url, "http://h/index.php?a=1");
        assert_eq!(submission.fields, vec![("q".to_string(), String::new())]);
    }
}
