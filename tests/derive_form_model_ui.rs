#[test]
fn form_model_derive_accepts_named_structs_only() {
    let cases = trybuild::TestCases::new();
    cases.pass("tests/ui/form_model/pass.rs");
    for rejected in ["fail_generic", "fail_tuple", "fail_enum"] {
        cases.compile_fail(format!("tests/ui/form_model/{rejected}.rs"));
    }
}
