#![cfg(target_arch = "wasm32")]

use form_validator_web::{JsFormValidator, WebDocument};
use js_sys::{Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;
use web_sys::{HtmlFormElement, HtmlInputElement};

wasm_bindgen_test_configure!(run_in_browser);

fn mount(id: &str, html: &str) -> HtmlFormElement {
    let document = WebDocument::current().unwrap();
    let form = document.document().create_element("form").unwrap();
    form.set_id(id);
    form.set_inner_html(html);
    document.document().body().unwrap().append_child(&form).unwrap();
    form.dyn_into::<HtmlFormElement>().unwrap()
}

fn input(id: &str) -> HtmlInputElement {
    WebDocument::current()
        .unwrap()
        .document()
        .get_element_by_id(id)
        .unwrap()
        .dyn_into::<HtmlInputElement>()
        .unwrap()
}

fn options(source: &str) -> JsValue {
    js_sys::eval(&format!("({})", source)).unwrap()
}

fn global(key: &str) -> JsValue {
    Reflect::get(&js_sys::global(), &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
fn test_mutators_chain_and_callbacks_see_the_validator() {
    mount("js-chain", r#"<input id="js-chain-email" name="email" type="text">"#);
    let validator = JsFormValidator::new(options(
        "{ form: '#js-chain', fields: { email: { rules: { required: true, type: 'email' } } } }",
    ))
    .unwrap();

    let fail = Function::new_with_args(
        "errors",
        "globalThis.chainFail = this.getErrors().length + ':' + errors[0].field;",
    );
    let success = Function::new_no_args("globalThis.chainSuccess = this.checkField('email');");
    let chained = validator
        .replace_message("required", "%label is missing")
        .unwrap()
        .fail(fail)
        .unwrap()
        .success(success)
        .unwrap();

    assert!(!chained.validate(None).unwrap());
    assert_eq!(global("chainFail").as_string().as_deref(), Some("1:email"));

    input("js-chain-email").set_value("a@b.com");
    assert!(validator.validate(None).unwrap());
    assert_eq!(global("chainSuccess").as_bool(), Some(true));
}

#[wasm_bindgen_test]
fn test_success_callback_may_submit() {
    let form = mount("js-submit", r#"<input name="name" type="text" value="Ada">"#);
    let sink = WebDocument::current().unwrap().document().create_element("iframe").unwrap();
    sink.set_attribute("name", "js-submit-sink").unwrap();
    sink.set_attribute("hidden", "").unwrap();
    form.append_child(&sink).unwrap();
    form.set_target("js-submit-sink");
    form.set_action("about:blank");

    let validator = JsFormValidator::new(options("{ form: '#js-submit', fields: { name: { rules: { required: true } } } }"))
        .unwrap()
        .success(Function::new_no_args("this.submit(); globalThis.submitted = true;"))
        .unwrap();

    assert!(validator.validate(None).unwrap());
    assert_eq!(global("submitted").as_bool(), Some(true));
}

#[wasm_bindgen_test]
fn test_context_option_overrides_this() {
    mount("js-context", r#"<input name="code" type="text">"#);
    let validator = JsFormValidator::new(options(
        "{ form: '#js-context', context: { tag: 'ctx' }, fields: { code: { rules: { required: true } } } }",
    ))
    .unwrap()
    .fail(Function::new_no_args("globalThis.contextTag = this.tag;"))
    .unwrap();

    assert!(!validator.validate(None).unwrap());
    assert_eq!(global("contextTag").as_string().as_deref(), Some("ctx"));
}

#[wasm_bindgen_test]
fn test_check_field_and_get_error_shapes() {
    mount("js-shapes", r#"<input id="js-shapes-name" name="name" type="text">"#);
    let validator = JsFormValidator::new(options("{ form: '#js-shapes', fields: { name: { rules: { required: true } } } }"))
        .unwrap();

    assert_eq!(validator.get_error().unwrap(), JsValue::FALSE);
    assert!(validator.check_field("unknown").unwrap().is_undefined());

    let record = validator.check_field("name").unwrap();
    assert_eq!(Reflect::get(&record, &"field".into()).unwrap().as_string().as_deref(), Some("name"));
    assert_eq!(Reflect::get(&record, &"rule".into()).unwrap().as_string().as_deref(), Some("required"));

    input("js-shapes-name").set_value("Ada");
    assert_eq!(validator.check_field("name").unwrap().as_bool(), Some(true));
    assert!(validator.validate(None).unwrap());
    assert_eq!(validator.get_error().unwrap(), JsValue::FALSE);
}

#[wasm_bindgen_test]
fn test_extensions_pass_only_on_true() {
    mount(
        "js-extend",
        r#"<input id="js-extend-code" name="code" type="text" value="x">
           <input name="kind" type="text" value="y">"#,
    );
    let validator = JsFormValidator::new(options("{ form: '#js-extend' }"))
        .unwrap()
        .extend_rule("truthy", "not true", Function::new_no_args("return 1;"))
        .unwrap()
        .extend_type("yes", Function::new_no_args("return 'yes';"))
        .unwrap()
        .set_fields(options("{ code: { rules: { truthy: true } }, kind: { rules: { type: 'yes' } } }"))
        .unwrap();

    assert!(!validator.validate(None).unwrap());
    assert_eq!(js_sys::Array::from(&validator.get_errors().unwrap()).length(), 2);

    validator
        .extend_rule("truthy", "not true", Function::new_no_args("return true;"))
        .unwrap()
        .extend_type("yes", Function::new_no_args("return true;"))
        .unwrap();
    assert!(validator.validate(None).unwrap());
}

#[wasm_bindgen_test]
fn test_form_element_as_option() {
    let form = mount("js-element", r#"<input name="name" type="text">"#);
    let options = Object::new();
    Reflect::set(&options, &"form".into(), &form).unwrap();
    Reflect::set(&options, &"fields".into(), &self::options("{ name: { rules: { required: true } } }")).unwrap();

    let validator = JsFormValidator::new(options.into()).unwrap();
    assert!(validator.get_field("name").unwrap().is_object());
    assert!(!validator.validate(None).unwrap());
}

#[wasm_bindgen_test]
fn test_regexp_rule_runs_in_the_host_engine() {
    mount("js-regexp", r#"<input id="js-regexp-code" name="code" type="text" value="abc">"#);
    let validator = JsFormValidator::new(options(
        r"{ form: '#js-regexp', fields: { code: { rules: { regex: /^(?=.*\d).{3,}$/ } } } }",
    ))
    .unwrap();

    assert!(!validator.validate(None).unwrap());
    input("js-regexp-code").set_value("ab1");
    assert!(validator.validate(None).unwrap());
}
