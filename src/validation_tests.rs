use super::*;
use serde_json::json;

fn registration() -> RegistrationData {
    RegistrationData {
        name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        phone: "0911223344".into(),
        business_name: "Ada's Diner".into(),
        tin: "TIN-0001".into(),
        password: "secret1".into(),
        password_confirmation: "secret1".into(),
    }
}

#[test]
fn registration_check_reports_missing_fields_in_declared_order() {
    let mut d = registration();
    d.tin = "  ".into();
    d.name.clear();
    let err = check_registration(&d).unwrap_err();
    assert_eq!(err.message(), "Missing required fields: name, tin");
    assert_eq!(err.http_status(), 422);
}

#[test]
fn registration_check_fails_fast_in_rule_order() {
    let mut d = registration();
    d.email = "not-an-email".into();
    d.password = "short".into();
    d.password_confirmation = "short".into();
    assert_eq!(check_registration(&d).unwrap_err().message(), "Please enter a valid email address");

    d.email = "ada@example.com".into();
    assert_eq!(check_registration(&d).unwrap_err().code_str(), "password_too_short");

    d.password = "secret1".into();
    d.password_confirmation = "secret2".into();
    assert_eq!(check_registration(&d).unwrap_err().message(), "Password confirmation does not match");

    d.password_confirmation = "secret1".into();
    d.phone = "12345".into();
    assert_eq!(check_registration(&d).unwrap_err().message(), "Please enter a valid phone number");

    d.phone = "0911223344".into();
    assert!(check_registration(&d).is_ok());
}

#[test]
fn registration_check_measures_trimmed_email_and_phone() {
    let mut d = registration();
    d.email = "  ADA@example.com ".into();
    assert!(check_registration(&d).is_ok());

    d.phone = "   123456789".into();
    assert_eq!(check_registration(&d).unwrap_err().code_str(), "invalid_phone");
    d.phone = " 0911223344 ".into();
    assert!(check_registration(&d).is_ok());
}

#[test]
fn form_validator_records_first_failure_per_field() {
    let mut v = schemas::registration();
    let form = json!({
        "name": "A",
        "email": "ada@example.com",
        "phone": "+1 (234) 567-890",
        "business_name": "Diner",
        "tin": "12345",
        "password": "secret1",
        "password_confirmation": "secret2",
    });
    assert!(!v.validate_form(&form));
    assert_eq!(v.errors().get("name").map(String::as_str), Some("Name must be at least 2 characters"));
    assert_eq!(v.errors().get("password_confirmation").map(String::as_str), Some("Passwords must match"));
    assert!(!v.errors().contains_key("phone"));
    assert_eq!(v.errors().len(), 2);

    let fixed = json!({"name": "Ada", "password": "secret1", "password_confirmation": "secret1"});
    assert!(v.validate_field("name", &fixed));
    assert!(v.validate_field("password_confirmation", &fixed));
    assert!(v.errors().is_empty());
}

#[test]
fn optional_fields_skip_checks_when_blank() {
    let mut v = schemas::menu_item();
    let form = json!({"item_name": "Injera", "category_id": 2, "price": "12.5", "tax_percentage": 15});
    assert!(v.validate_form(&form));

    let bad = json!({"item_name": "Injera", "category_id": 0, "price": 20000, "tax_percentage": 101, "discount": -1});
    assert!(!v.validate_form(&bad));
    assert_eq!(v.errors()["category_id"], "Please select a category");
    assert_eq!(v.errors()["price"], "Price must not exceed $10,000");
    assert_eq!(v.errors()["tax_percentage"], "Tax percentage must be between 0 and 100");
    assert_eq!(v.errors()["discount"], "Discount must be between 0 and 100");
    v.reset_errors();
    assert!(v.errors().is_empty());
}

#[test]
fn validate_returns_field_errors_as_app_error() {
    #[derive(serde::Serialize)]
    struct Login { email: String, password: String }
    let mut v = schemas::login();
    let err = v.validate(&Login { email: "bad".into(), password: String::new() }).unwrap_err();
    let fields = err.field_errors().unwrap();
    assert_eq!(fields["email"], "Invalid email format");
    assert_eq!(fields["password"], "Password is required");
}

#[test]
fn phone_and_email_helpers() {
    assert!(is_valid_phone("+251 911 223 344"));
    assert!(!is_valid_phone("0911223344"));
    assert!(!is_valid_phone(""));
    assert!(is_valid_email("a@b.co"));
    assert!(!is_valid_email("a b@c.d"));
    assert!(!is_valid_email("a@b"));
}
