use unoui::form::{FieldValue, FormModel};

#[derive(Clone, unoui::form::FormModel)]
struct SignupForm {
    email: String,
    age: i64,
    nickname: Option<String>,
    r#type: String,
}

fn main() {
    assert_eq!(
        SignupForm::field_names(),
        &["email", "age", "nickname", "type"]
    );

    let model = SignupForm {
        email: "a@uno.ui".to_string(),
        age: 30,
        nickname: None,
        r#type: "personal".to_string(),
    };
    let values = model.to_values();
    assert_eq!(values.get("email"), Some(&FieldValue::from("a@uno.ui")));
    assert!(!values.contains_key("nickname"));

    let restored = SignupForm::from_values(&values).expect("values round trip");
    assert_eq!(restored.age, 30);
    assert_eq!(restored.r#type, "personal");
}
