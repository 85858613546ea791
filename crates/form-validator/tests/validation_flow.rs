use form_validator::memory::{MemoryControl, MemoryDocument, MemoryForm};
use form_validator::{
    ChangeEvent, FieldError, FieldOptions, FieldValue, FileInfo, FormValidator, Item, RuleParam,
    ValidatorConfig,
};
use std::cell::RefCell;
use std::rc::Rc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("form_validator=debug")
        .with_test_writer()
        .try_init();
}

fn signup_form() -> (Rc<MemoryForm>, MemoryControl, MemoryControl, MemoryControl) {
    let email = MemoryControl::input("email", "");
    let password = MemoryControl::input("password", "");
    let confirm = MemoryControl::input("password", "");
    let form = Rc::new(
        MemoryForm::new()
            .with("email", email.clone())
            .with("password", password.clone())
            .with("password_confirm", confirm.clone()),
    );
    (form, email, password, confirm)
}

fn signup_validator(form: Rc<MemoryForm>) -> FormValidator {
    let document = MemoryDocument::new().with_form(Some("signup"), None, form);
    let config = ValidatorConfig::for_form("#signup")
        .unwrap()
        .field(
            "email",
            FieldOptions::new()
                .label("E-mail")
                .rule("required", true)
                .rule("type", "email"),
        )
        .field("password", FieldOptions::new().rule("min-length", 6))
        .field("password_confirm", FieldOptions::new().rule("match", "password"));
    FormValidator::from_document(&document, config).unwrap()
}

#[test]
fn required_empty_field_reports_only_required() {
    init_tracing();
    let (form, _, _, _) = signup_form();
    let mut validator = signup_validator(form);

    assert!(!validator.validate(None));
    let errors = validator.get_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "email");
    assert_eq!(errors[0].rule, "required");
    assert_eq!(errors[0].messages, vec!["The field \"E-mail\" is required".to_string()]);
}

#[test]
fn optional_empty_fields_skip_their_rules() {
    init_tracing();
    let (form, email, _, _) = signup_form();
    let mut validator = signup_validator(form);

    email.set_value("a@b.com");
    assert!(validator.validate(None));
    assert!(validator.get_errors().is_empty());
    assert!(validator.get_error().is_none());
}

#[test]
fn email_type_uses_label_in_message() {
    init_tracing();
    let (form, email, _, _) = signup_form();
    let mut validator = signup_validator(form);

    email.set_value("a@b.com");
    assert_eq!(validator.is_valid("email"), Some(true));

    email.set_value("not-an-email");
    let error = validator.check_field("email").unwrap().unwrap_err();
    assert_eq!(error.rule, "type");
    assert_eq!(error.message, "The value of the field \"E-mail\" is invalid");
}

#[test]
fn match_rule_compares_current_values() {
    init_tracing();
    let (form, email, password, confirm) = signup_form();
    let mut validator = signup_validator(form);
    email.set_value("a@b.com");

    password.set_value("secret1");
    confirm.set_value("secret1");
    assert!(validator.validate(None));

    confirm.set_value("secret2");
    assert!(!validator.validate(None));
    let error = validator.get_error().unwrap();
    assert_eq!(error.field, "password_confirm");
    assert_eq!(
        error.message,
        "The field \"password_confirm\" must match the field \"password\""
    );
}

#[test]
fn multi_file_field_fails_once() {
    init_tracing();
    let upload = MemoryControl::files_input(vec![
        FileInfo::new("photo.jpg", "image/jpeg", 2048),
        FileInfo::new("setup.exe", "application/octet-stream", 4096),
        FileInfo::new("run.bat", "text/plain", 12),
    ]);
    let form = Rc::new(MemoryForm::new().with("attachments", upload));
    let config = ValidatorConfig::for_form("#upload").unwrap().field(
        "attachments",
        FieldOptions::new()
            .label("Attachments")
            .rule("file-ext", vec!["jpg", "png"]),
    );
    let mut validator = FormValidator::new(form, config);

    assert!(!validator.validate(None));
    let errors = validator.get_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].rule, "file-ext");
    assert_eq!(errors[0].messages.len(), 1);
}

#[test]
fn extended_rule_receives_value_param_and_field() {
    init_tracing();
    let code = MemoryControl::text("ab-12");
    let form = Rc::new(MemoryForm::new().with("code", code.clone()));
    let seen: Rc<RefCell<Vec<(String, String, String)>>> = Rc::new(RefCell::new(Vec::new()));

    let mut validator = FormValidator::new(form, ValidatorConfig::for_form("#f").unwrap());
    let log = seen.clone();
    validator
        .extend_rule("prefix", "%label must start with %param", move |input| {
            let value = input.value.as_text().unwrap_or_default().to_string();
            log.borrow_mut()
                .push((value.clone(), input.param.to_string(), input.field.name.clone()));
            Ok(value.starts_with(input.param.as_text().unwrap_or_default()))
        })
        .set_field("code", FieldOptions::new().label("Code").rule("prefix", "zz"));

    assert!(!validator.validate(None));
    assert_eq!(
        seen.borrow().as_slice(),
        &[("ab-12".to_string(), "zz".to_string(), "code".to_string())]
    );
    assert_eq!(validator.get_error().unwrap().message, "Code must start with zz");

    code.set_value("zz-12");
    assert!(validator.validate(None));
}

#[test]
fn extended_type_is_used_by_type_rule() {
    init_tracing();
    let zip = MemoryControl::text("2800");
    let form = Rc::new(MemoryForm::new().with("zip", zip.clone()));
    let mut validator = FormValidator::new(form, ValidatorConfig::for_form("#f").unwrap());
    validator
        .extend_type("zip", |item, _field| {
            item.as_text().map_or(false, |text| text.len() == 5)
        })
        .set_field("zip", FieldOptions::new().rule("type", "zip"));

    assert_eq!(validator.is_valid("zip"), Some(false));
    zip.set_value("28001");
    assert_eq!(validator.is_valid("zip"), Some(true));
}

#[test]
fn change_event_sees_fresh_value_before_callbacks() {
    init_tracing();
    let name = MemoryControl::text("");
    let form = Rc::new(MemoryForm::new().with("name", name.clone()));
    let order: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let field_log = order.clone();
    let instance_log = order.clone();
    let mut validator = FormValidator::new(form, ValidatorConfig::for_form("#f").unwrap());
    validator
        .set_field(
            "name",
            FieldOptions::new()
                .rule("min-length", 3)
                .on_change(move |field, error, _event| {
                    field_log
                        .borrow_mut()
                        .push(format!("field:{}:{}", field.value, error.is_some()));
                }),
        )
        .change(move |field, error, event| {
            instance_log
                .borrow_mut()
                .push(format!("form:{}:{}:{}", event.field, field.value, error.is_some()));
        });

    name.set_value("Jo");
    validator.handle_change(&ChangeEvent::new("name", 0));
    assert_eq!(validator.get_value("name"), Some(FieldValue::text("Jo")));

    name.set_value("Joe");
    validator.handle_change(&ChangeEvent::new("name", 0));

    assert_eq!(
        order.borrow().as_slice(),
        &[
            "field:Jo:true".to_string(),
            "form:name:Jo:true".to_string(),
            "field:Joe:false".to_string(),
            "form:name:Joe:false".to_string(),
        ]
    );
}

#[test]
fn repeated_validation_is_stable() {
    init_tracing();
    let (form, email, password, _) = signup_form();
    let mut validator = signup_validator(form);
    email.set_value("nope");
    password.set_value("abc");

    assert!(!validator.validate(None));
    let first: Vec<FieldError> = validator.get_errors().to_vec();
    assert!(!validator.validate(None));
    assert_eq!(validator.get_errors(), first.as_slice());
    assert_eq!(first.len(), 2);
}

#[test]
fn lifecycle_callbacks_fire_in_order() {
    init_tracing();
    let (form, email, _, _) = signup_form();
    let mut validator = signup_validator(form.clone());
    let events: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let always = events.clone();
    let success = events.clone();
    let fail = events.clone();
    validator
        .always(move |values, errors| {
            always
                .borrow_mut()
                .push(format!("always:{}:{}", values.len(), errors.len()));
        })
        .success(move |values| {
            success
                .borrow_mut()
                .push(format!("success:{}", values["email"]));
        })
        .fail(move |errors| {
            fail.borrow_mut().push(format!("fail:{}", errors[0].field));
        });

    let per_call = events.clone();
    let callback = move |_: &form_validator::FieldValues, errors: &[FieldError]| {
        per_call.borrow_mut().push(format!("callback:{}", errors.len()));
    };

    validator.validate(Some(&callback));
    email.set_value("a@b.com");
    validator.validate(Some(&callback));

    assert_eq!(
        events.borrow().as_slice(),
        &[
            "always:3:1".to_string(),
            "fail:email".to_string(),
            "callback:1".to_string(),
            "always:3:0".to_string(),
            "success:a@b.com".to_string(),
            "callback:0".to_string(),
        ]
    );
    assert_eq!(form.submissions(), 0);
}

#[test]
fn disabled_fields_are_skipped_and_omitted() {
    init_tracing();
    let nickname = MemoryControl::text("");
    let form = Rc::new(MemoryForm::new().with("nickname", nickname.clone()));
    let config = ValidatorConfig::for_form("#f")
        .unwrap()
        .field("nickname", FieldOptions::new().rule("required", true));
    let mut validator = FormValidator::new(form, config);

    nickname.set_disabled(true);
    let values = Rc::new(RefCell::new(None));
    let sink = values.clone();
    validator.success(move |current| *sink.borrow_mut() = Some(current.len()));

    assert!(validator.validate(None));
    assert_eq!(*values.borrow(), Some(0));
}

#[test]
fn validate_callback_rule_and_regex_from_json() {
    init_tracing();
    let username = MemoryControl::text("admin");
    let form = Rc::new(MemoryForm::new().with("username", username.clone()));
    let document = MemoryDocument::new().with_form(None, Some("login"), form);
    let config = ValidatorConfig::from_json(
        r#"{"form": "login", "fields": {"username": {"rules": {"regex": "^[a-z]+$"}}}}"#,
    )
    .unwrap();
    let mut validator = FormValidator::from_document(&document, config).unwrap();

    validator.set_field(
        "username",
        FieldOptions::new()
            .rule("regex", regex::Regex::new("^[a-z]+$").unwrap())
            .rule(
                "validate",
                RuleParam::callback(|item: &Item, _field| item.as_text() != Some("admin")),
            )
            .message("validate", "%label is reserved"),
    );

    assert!(!validator.validate(None));
    assert_eq!(validator.get_error().unwrap().message, "username is reserved");

    username.set_value("alice");
    assert!(validator.validate(None));
}

#[test]
fn on_submit_blocks_invalid_and_prevent_default_forms() {
    init_tracing();
    let (form, email, _, _) = signup_form();
    let document = MemoryDocument::new().with_form(Some("signup"), None, form.clone());
    let config = ValidatorConfig::for_form("#signup")
        .unwrap()
        .prevent_default(false)
        .field("email", FieldOptions::new().rule("required", true));
    let mut validator = FormValidator::from_document(&document, config).unwrap();

    assert!(validator.on_submit());
    email.set_value("x");
    assert!(!validator.on_submit());

    validator.submit();
    assert_eq!(form.submissions(), 1);
}

#[test]
fn comma_separated_names_share_options() {
    init_tracing();
    let first = MemoryControl::text("Ana");
    let last = MemoryControl::text("L0pez");
    let form = Rc::new(
        MemoryForm::new()
            .with("first_name", first)
            .with("last_name", last),
    );
    let config = ValidatorConfig::from_yaml(
        "form: '#people'\nfields:\n  first_name, last_name:\n    rules:\n      type: letters\n",
    )
    .unwrap();
    let mut validator = FormValidator::new(form, config);

    assert!(validator.get_field("first_name").is_some());
    assert!(!validator.validate(None));
    let failed: Vec<&str> = validator
        .get_errors()
        .iter()
        .map(|error| error.field.as_str())
        .collect();
    assert_eq!(failed, vec!["last_name"]);
}
