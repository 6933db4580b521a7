#[cfg(test)]
mod kvc_tests {
    use std::rc::Rc;

    use kvexpr as kx;

    use kx::error::{Error, EvalError};
    use kx::format::format_value;
    use kx::interpreter::Interpreter;
    use kx::json::parse_json;
    use kx::value::Value;

    fn run(source: &str) -> Result<Value, Error> {
        Interpreter::new().run(source)
    }

    fn text(source: &str) -> String {
        let value = run(source).unwrap_or_else(|e| panic!("{:?} failed: {}", source, e));
        format_value(&value).unwrap_or_else(|e| panic!("{:?}: {}", source, e))
    }

    /// Force `field` of the KVC `source` evaluates to, drop everything and
    /// report whether the KVC was freed.
    fn freed_after_forcing(source: &str, field: &str) -> bool {
        let value = run(source).unwrap_or_else(|e| panic!("{:?} failed: {}", source, e));
        let weak = match &value {
            Value::Kvc(kvc) => {
                let forced = kvc.get_field(field).unwrap();
                assert!(forced.is_some(), "{:?} has no field {}", source, field);
                Rc::downgrade(kvc)
            }
            other => panic!("{:?} gave {:?}, not a kvc", source, other),
        };
        drop(value);
        weak.upgrade().is_none()
    }

    #[test]
    fn test_kvc_01_fields_see_each_other_in_any_order() {
        assert_eq!(text("{a: 3, c: 5, d: a * c}.d"), "15");
        assert_eq!(text("{d: a * c, a: 3, c: 5}.d"), "15");
        assert_eq!(text("{a: 3; c: 5; d: a * c}"), "{a: 3, c: 5, d: 15}");
    }

    #[test]
    fn test_kvc_02_return_expression() {
        assert_eq!(text("{a: 2, return a * 3}"), "6");
        assert_eq!(text("{a: 2; eval a * 3;}"), "6");
        assert_eq!(text("a: 1; b: a + 1; return b"), "2");
    }

    #[test]
    fn test_kvc_03_fields_are_lazy() {
        assert_eq!(text("{bad: missing_name, good: 1}.good"), "1");
        assert!(matches!(
            run("{bad: missing_name, good: 1}.bad"),
            Err(Error::Eval(EvalError::Undefined { .. }))
        ));
    }

    #[test]
    fn test_kvc_04_shadowing_falls_back_to_the_parent() {
        assert_eq!(text("{x: 1, k: {x: x + 1}}.k.x"), "2");
        assert_eq!(text("{a: 4}{a: a}"), "{a: 4}");
    }

    #[test]
    fn test_kvc_05_cycles_are_reported() {
        for source in ["{a: b, b: a}.a", "{a: a}.a"] {
            match run(source) {
                Err(Error::Eval(EvalError::CircularReference { name })) => {
                    assert!(name == "a" || name == "b", "{}", name)
                }
                other => panic!("{:?} gave {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_kvc_06_inherited_fields() {
        assert_eq!(text("{x: 5, k: {x}}.k.x"), "5");
        assert_eq!(text("{k: {zz}}.k.zz"), "null");
        assert_eq!(text("{k: {zz}}.k"), "{zz: null}");
    }

    #[test]
    fn test_kvc_07_selectors() {
        assert_eq!(text("{a: 1, b: 2}{a}"), "{a: 1}");
        assert_eq!(text("{a: 1, b: 2}{a, c: b * 10}"), "{a: 1, c: 20}");
        assert_eq!(
            text("[{a: 1, b: 2}, {a: 3, b: 4}]{b}"),
            "[{b: 2}, {b: 4}]"
        );
        assert_eq!(text("null{a}"), "null");
    }

    #[test]
    fn test_kvc_08_merge() {
        assert_eq!(
            text("{a: 1, b: {x: 1, y: 2}} + {b: {y: 3}, c: 4}"),
            "{a: 1, b: {x: 1, y: 3}, c: 4}"
        );
        assert_eq!(text("{a: {x: 1}} + {a: 5}"), "{a: 5}");
    }

    #[test]
    fn test_kvc_09_closures_keep_their_scope() {
        assert_eq!(
            text("{x: 1, f: (y) => x + y, inner: {x: 100, r: f(1)}, return inner.r}"),
            "2"
        );
        assert_eq!(
            text("{make: (n) => (m) => n + m, add5: make(5), return add5(3)}"),
            "8"
        );
    }

    #[test]
    fn test_kvc_10_quoted_keys_and_lookup() {
        assert_eq!(text("{'my key': 1}('my key')"), "1");
        assert_eq!(text("{\"a b\": 1, c: 2}"), r#"{"a b": 1, c: 2}"#);
        assert_eq!(text("{Name: 'x'}('NAME')"), r#""x""#);
        assert_eq!(text("len({a: 1, b: 2})"), "2");
    }

    #[test]
    fn test_kvc_11_member_of_null_throws() {
        assert!(matches!(
            run("null.a"),
            Err(Error::Eval(EvalError::MemberOfNull { .. }))
        ));
        assert_eq!(text("null?.a"), "null");
        assert_eq!(text("{a: null}.a?.b"), "null");
        assert_eq!(text("{a: 1}.b"), "null");
    }

    #[test]
    fn test_kvc_12_selectors_see_the_scope_they_are_written_in() {
        assert_eq!(text("{x: 5, s: {a: 1}, r: s{c: a + x}}.r.c"), "6");
        assert_eq!(text("{x: 5, r: ({a: 1} + {b: 2}){c: a + x}}.r.c"), "6");
        assert_eq!(text("({a: [1, 2]} + {b: 1}){n: len(a)}.n"), "2");
        assert_eq!(text("{s: {a: 1}, f: (x) => s{c: a + x}}.f(10).c"), "11");
        assert_eq!(text("({a: 1} + {b: 2}){a, b}"), "{a: 1, b: 2}");

        let data = parse_json(r#"{"a": [1, 2, 3], "b": 4}"#).unwrap();
        let interpreter = Interpreter::with_variables([("data", data), ("k", Value::Integer(10))]);
        let value = interpreter.run("data{n: len(a) * k, b}").unwrap();
        assert_eq!(format_value(&value).unwrap(), "{n: 30, b: 4}");
    }

    #[test]
    fn test_kvc_13_kvcs_are_freed_once_released() {
        assert!(freed_after_forcing("{f: (y) => y, g: 1}", "f"));
        assert!(freed_after_forcing("{x: 1, k: {y: x}}", "k"));
        assert!(freed_after_forcing("{fs: [(y) => y]}", "fs"));
        assert!(freed_after_forcing(
            "{make: (n) => (m) => n + m, add5: make(5)}",
            "add5"
        ));
        assert!(freed_after_forcing("{a: 1, b: [1, 2]}", "b"));
    }

    #[test]
    fn test_kvc_14_closures_outlive_their_kvc() {
        let f = run("{k: 2, f: (y) => y * k}.f").unwrap();
        let interpreter = Interpreter::with_variables([("f", f)]);
        assert!(matches!(interpreter.run("f(21)"), Ok(Value::Integer(42))));

        assert_eq!(text("{k: {v: 3}, r: k.v + k.v}.r"), "6");
    }

    #[test]
    fn test_kvc_15_naked_kvc_may_start_with_an_inherited_key() {
        let interpreter = Interpreter::with_variables([("a", Value::Integer(1))]);
        assert!(matches!(
            interpreter.run("a, b: a + 1; return b"),
            Ok(Value::Integer(2))
        ));
        let value = interpreter.run("a; b: 2").unwrap();
        assert_eq!(format_value(&value).unwrap(), "{a: 1, b: 2}");
    }
}
