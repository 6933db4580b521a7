#[cfg(test)]
mod evaluation_tests {
    use kvexpr as kx;

    use kx::environment::MapProvider;
    use kx::error::{Error, EvalError};
    use kx::format::format_value;
    use kx::function::NativeFunction;
    use kx::interpreter::Interpreter;
    use kx::kvc::Kvc;
    use kx::value::{error_types, Value};

    fn eval(source: &str) -> Value {
        Interpreter::new()
            .run(source)
            .unwrap_or_else(|e| panic!("{:?} failed: {}", source, e))
    }

    /// Literal text of the result, which keeps kinds visible (`2` vs `2l`
    /// vs `2.0`).
    fn text(source: &str) -> String {
        format_value(&eval(source)).unwrap_or_else(|e| panic!("{:?}: {}", source, e))
    }

    fn error_type(source: &str) -> String {
        match eval(source) {
            Value::Error(e) => e.error_type.clone(),
            other => panic!("{:?} gave {:?}, not an error value", source, other),
        }
    }

    #[test]
    fn test_evaluation_01_arithmetic() {
        assert_eq!(text("1 + 2 * 3"), "7");
        assert_eq!(text("(1 + 2) * 3"), "9");
        assert_eq!(text("2 ^ 10"), "1024");
        assert_eq!(text("10 % 3"), "1");
        assert_eq!(text("-(1 + 2)"), "-3");
        assert_eq!(text("10 - 2 - 3"), "5");
    }

    #[test]
    fn test_evaluation_02_addition_of_other_kinds() {
        assert_eq!(eval("'a' + 1").as_str(), Some("a1"));
        assert_eq!(eval("1 + 2 + 'a'").as_str(), Some("3a"));
        assert_eq!(eval("'a' + 1 + 2").as_str(), Some("a12"));
        assert_eq!(eval("1.5 + 1 + 'x' + 2").as_str(), Some("2.5x2"));
        assert_eq!(text("[1, 2] + [3]"), "[1, 2, 3]");
        assert_eq!(text("1 + null"), "1");
        assert_eq!(error_type("1 - null"), error_types::NULL_OPERAND);
        assert_eq!(error_type("true * 2"), error_types::TYPE_MISMATCH);
    }

    #[test]
    fn test_evaluation_03_comparison() {
        assert_eq!(text("1 < 2"), "true");
        assert_eq!(text("2 <= 2.0"), "true");
        assert_eq!(text("'b' > 'a'"), "true");
        assert_eq!(text("1 = 1.0"), "true");
        assert_eq!(text("1 = 'a'"), "false");
        assert_eq!(text("[1] != 1"), "true");
        assert_eq!(text("{a: 1} = {A: 1}"), "true");
        assert_eq!(text("2 in [1, 2, 3]"), "true");
        assert_eq!(text("null < '98'"), "null");
        assert_eq!(error_type("1 < 'a'"), error_types::TYPE_MISMATCH);
    }

    #[test]
    fn test_evaluation_04_logic_short_circuits() {
        assert_eq!(text("!true or false"), "false");
        assert_eq!(text("false and missing_name"), "false");
        assert_eq!(text("true or missing_name"), "true");
        assert!(matches!(
            Interpreter::new().run("true and missing_name"),
            Err(Error::Eval(EvalError::Undefined { .. }))
        ));
        assert_eq!(error_type("not(null)"), error_types::TYPE_MISMATCH);
        assert_eq!(error_type("1 and true"), error_types::TYPE_MISMATCH);
    }

    #[test]
    fn test_evaluation_05_null_operators() {
        assert_eq!(text("null ?? 5"), "5");
        assert_eq!(text("3 ?? 5"), "3");
        assert_eq!(text("null ?! 5"), "null");
        assert_eq!(text("1 ?! 5"), "5");
    }

    #[test]
    fn test_evaluation_06_control_forms() {
        assert_eq!(text("if 1 < 2 then 'a' else 'b'"), r#""a""#);
        assert_eq!(text("if null then 'a' else 'b'"), r#""b""#);
        assert_eq!(text("case 1 = 2: 'x', 2 = 2: 'y', 'z'"), r#""y""#);
        assert_eq!(text("case false: 'x'"), "null");
        assert_eq!(text("switch 3, 1: 'a', 3: 'c', 'z'"), r#""c""#);
        assert_eq!(text("switch 9, 1: 'a', 'z'"), r#""z""#);
        // branches not taken are never evaluated
        assert_eq!(text("if true then 1 else missing_name"), "1");
    }

    #[test]
    fn test_evaluation_07_collections() {
        assert_eq!(text("range(1, 3)"), "[1, 2, 3]");
        assert_eq!(text("len('abc')"), "3");
        assert_eq!(text("len([1, 2])"), "2");
        assert_eq!(text("[1, 2, 3] map (x) => x * 2"), "[2, 4, 6]");
        assert_eq!(text("[10, 20, 30] map (x, i) => i"), "[0, 1, 2]");
        assert_eq!(text("[1, 2, 3] filter x => x > 1"), "[2, 3]");
        assert_eq!(text("reduce([1, 2, 3], (acc, x) => acc + x)"), "6");
        assert_eq!(text("[1, 2, 3] reduce (acc, x) => acc + x ~ 10"), "16");
        assert_eq!(text("[1, 2, 3](1)"), "2");
        assert_eq!(text("[1, 2, 3][5]"), "null");
        assert_eq!(text("{a: 1}('a')"), "1");
    }

    #[test]
    fn test_evaluation_08_pipes_and_lambdas() {
        assert_eq!(text("5 >> (x) => x + 1"), "6");
        assert_eq!(text("((a, b) => a * b)(6, 7)"), "42");
        assert!(matches!(
            Interpreter::new().run("((a, b) => a)(1)"),
            Err(Error::Eval(EvalError::ParameterCountMismatch { actual: 1, .. }))
        ));
    }

    #[test]
    fn test_evaluation_09_strings() {
        assert_eq!(eval("f'sum {1 + 2}!'").as_str(), Some("sum 3!"));
        assert_eq!(eval("f'\\{x}'").as_str(), Some("{x}"));
        assert_eq!(eval("'tab\\there'").as_str(), Some("tab\there"));
        assert_eq!(eval("concat('a', null, 1)").as_str(), Some("a1"));
    }

    #[test]
    fn test_evaluation_10_templates() {
        let interpreter = Interpreter::with_variables([("name", Value::string("Ann"))]);
        let value = interpreter
            .run_template("Hello ${name}, ${'wor' + 'ld'}! \\${x}")
            .unwrap();
        assert_eq!(value.as_str(), Some("Hello Ann, world! ${x}"));

        let value = Interpreter::new().run_template("${1 + 2}").unwrap();
        assert_eq!(value.as_str(), Some("3"));
    }

    #[test]
    fn test_evaluation_11_host_variables_and_functions() {
        let interpreter = Interpreter::with_variables([("x", Value::Integer(41))]);
        assert!(matches!(interpreter.run("x + 1"), Ok(Value::Integer(42))));

        let record = Value::Kvc(Kvc::from_values(vec![("Name", Value::string("ann"))]));
        let interpreter = Interpreter::with_variables([("rec", record)]);
        assert_eq!(interpreter.run("rec.name").unwrap().as_str(), Some("ann"));

        let twice = NativeFunction::new("twice", 1, |args: &[Value]| match args[0].as_i64() {
            Some(n) => Ok(Value::Long(n * 2)),
            None => Ok(Value::type_mismatch("twice needs an integer")),
        });
        let times = NativeFunction::new("times", 2, |args: &[Value]| {
            match (args[0].as_i64(), args[1].as_i64()) {
                (Some(a), Some(b)) => Ok(Value::Long(a * b)),
                _ => Ok(Value::Null),
            }
        })
        .dual();
        let root = MapProvider::with_parent(kx::library::root())
            .with("twice", twice.into_value())
            .with("times", times.into_value())
            .into_ref();

        let interpreter = Interpreter::with_root(root);
        assert!(matches!(interpreter.run("twice(21)"), Ok(Value::Long(42))));
        assert!(matches!(interpreter.run("3 times 4"), Ok(Value::Long(12))));
    }

    #[test]
    fn test_evaluation_12_names_are_case_insensitive() {
        assert_eq!(text("{Abc: 1}.aBC"), "1");
        assert_eq!(text("TRUE and True"), "true");
        assert_eq!(text("LEN('ab')"), "2");
    }

    #[test]
    fn test_evaluation_13_each_thread_builds_its_own_root() {
        let handles: Vec<_> = (0..4)
            .map(|n| {
                std::thread::spawn(move || {
                    let interpreter = Interpreter::with_variables([("n", Value::Integer(n))]);
                    match interpreter.run("n * 10") {
                        Ok(Value::Integer(v)) => v,
                        _ => -1,
                    }
                })
            })
            .collect();

        let results: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![0, 10, 20, 30]);
    }
}
