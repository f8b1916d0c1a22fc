//! Property tests for argument coercion.

use lfb_db::Value;
use lfb_forms::{ArgSpec, ArgsValidator, ExpectedType};
use lfb_http::QueryDict;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_integer_text_validates(n in any::<i64>()) {
        let args = QueryDict::from_pairs([("n", n.to_string())]);
        let mut validator = ArgsValidator::new(&args);
        let value = validator.validate(&ArgSpec::new("n").expect(ExpectedType::Integer).required());
        prop_assert_eq!(value, Some(Value::Int(n)));
        prop_assert_eq!(validator.is_valid_request(), (true, String::new()));
    }

    #[test]
    fn prop_finite_float_text_validates(x in -1.0e12f64..1.0e12) {
        let args = QueryDict::from_pairs([("x", x.to_string())]);
        let mut validator = ArgsValidator::new(&args);
        let value = validator.validate(&ArgSpec::new("x").expect(ExpectedType::Float));
        prop_assert_eq!(value, Some(Value::Float(x)));
        prop_assert!(validator.is_valid_request().0);
    }

    #[test]
    fn prop_plain_text_validates_as_string(s in "[a-zA-Z0-9 _-]{1,24}") {
        prop_assume!(s != "None" && s != "null");
        let args = QueryDict::from_pairs([("s", s.as_str())]);
        let mut validator = ArgsValidator::new(&args);
        let value = validator.validate(&ArgSpec::new("s").expect(ExpectedType::String).required());
        prop_assert_eq!(value, Some(Value::String(s.clone())));
        prop_assert!(validator.is_valid_request().0);
    }

    #[test]
    fn prop_json_arrays_validate_as_lists(items in proptest::collection::vec(any::<i32>(), 0..8)) {
        let text = serde_json::to_string(&items).unwrap();
        let args = QueryDict::from_pairs([("ids", text)]);
        let mut validator = ArgsValidator::new(&args);
        let value = validator.validate(&ArgSpec::new("ids").expect(ExpectedType::List));
        prop_assert_eq!(value, Some(Value::Json(serde_json::json!(items))));
    }

    #[test]
    fn prop_first_invalid_message_surfaces(valid_before in 0usize..4, valid_after in 0usize..4) {
        let args = QueryDict::from_pairs([("ok", "1"), ("bad", "x")]);
        let mut validator = ArgsValidator::new(&args);
        let ok = ArgSpec::new("ok").expect(ExpectedType::Integer);
        for _ in 0..valid_before {
            validator.validate(&ok);
        }
        validator.validate(&ArgSpec::new("bad").expect(ExpectedType::Integer));
        for _ in 0..valid_after {
            validator.validate(&ok);
        }
        validator.validate(&ArgSpec::new("gone").required());
        prop_assert_eq!(validator.is_valid_request(), (false, "bad type error.".to_string()));
    }
}
