#[cfg(test)]
mod error_tests {
    use kvexpr as kx;

    use kx::error::{Error, EvalError, SyntaxError};
    use kx::interpreter::Interpreter;
    use kx::value::{error_types, Value};

    fn syntax_errors(source: &str) -> Vec<SyntaxError> {
        match Interpreter::new().run(source) {
            Err(Error::Syntax(errors)) => errors,
            Err(other) => panic!("{:?} failed with {}, not a syntax error", source, other),
            Ok(value) => panic!("{:?} evaluated to {:?}", source, value),
        }
    }

    fn first_message(source: &str) -> String {
        syntax_errors(source)
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_default()
    }

    fn eval_error(source: &str) -> EvalError {
        match Interpreter::new().run(source) {
            Err(Error::Eval(e)) => e,
            Err(other) => panic!("{:?} failed with {}, not an evaluation error", source, other),
            Ok(value) => panic!("{:?} evaluated to {:?}", source, value),
        }
    }

    #[test]
    fn test_errors_01_duplicate_keys_and_returns() {
        assert_eq!(first_message("{a: 5; a: 6; return 5;}"), "key 'a' is duplicated");
        assert_eq!(first_message("{a: 5; A: 6}"), "key 'A' is duplicated");
        assert_eq!(
            first_message("{return 1; return 2}"),
            "only one return expression is allowed"
        );
    }

    #[test]
    fn test_errors_02_missing_delimiters() {
        assert_eq!(first_message("(1 + 2"), "')' expected");
        assert_eq!(first_message("[1, 2"), "']' expected");
        assert_eq!(first_message("{a: 1"), "'}' expected");
        assert_eq!(first_message("f(1, 2"), "')' expected");
        assert_eq!(first_message("if true then 1"), "'else' expected");
        assert_eq!(first_message("if true 1 else 2"), "'then' expected");
        assert_eq!(first_message("{'key' 1}"), "':' expected");
    }

    #[test]
    fn test_errors_03_missing_operands() {
        assert_eq!(first_message("(x) =>"), "lambda body expected");
        assert_eq!(first_message("[1, 2] map"), "right operand of 'map' expected");
        assert_eq!(first_message("{a:}"), "value expression expected");
        assert_eq!(first_message("{a: 1}.3"), "member name expected");
    }

    #[test]
    fn test_errors_04_unterminated_text() {
        let errors = syntax_errors("'abc");
        assert_eq!(errors[0].message, "''' expected");
        assert_eq!(errors[0].position, 4);

        let errors = syntax_errors("f\"a{1}");
        assert_eq!(errors[0].message, "'\"' expected");

        let errors = syntax_errors("1 /* open");
        assert!(errors.iter().any(|e| e.message == "'*/' expected"));
    }

    #[test]
    fn test_errors_05_literal_errors() {
        assert_eq!(
            first_message("1.5l"),
            "'l' suffix is not allowed on a floating point literal"
        );
        assert_eq!(first_message("'\\u12'"), "invalid unicode escape");
    }

    #[test]
    fn test_errors_06_trailing_input() {
        assert!(matches!(
            Interpreter::new().run("1 2"),
            Err(Error::TrailingInput(2))
        ));
        assert!(matches!(
            Interpreter::new().run("1 +"),
            Err(Error::TrailingInput(2))
        ));
    }

    #[test]
    fn test_errors_07_arity_mismatch_throws() {
        match eval_error("1 > 2 > 3") {
            EvalError::ParameterCountMismatch {
                function,
                min,
                max,
                actual,
            } => {
                assert_eq!(function, ">");
                assert_eq!((min, max, actual), (2, Some(2), 3));
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            eval_error("len(1, 2)"),
            EvalError::ParameterCountMismatch { actual: 2, .. }
        ));
    }

    #[test]
    fn test_errors_08_thrown_errors() {
        assert_eq!(
            eval_error("foo + 1"),
            EvalError::Undefined {
                name: "foo".to_string()
            }
        );
        assert!(matches!(eval_error("5()"), EvalError::NotCallable(_)));
        assert!(matches!(eval_error("null.a"), EvalError::MemberOfNull { .. }));
    }

    #[test]
    fn test_errors_09_error_values_flow_through() {
        let interpreter = Interpreter::new();

        match interpreter.run("error('boom')") {
            Ok(Value::Error(e)) => {
                assert_eq!(e.error_type, error_types::USER_ERROR);
                assert_eq!(e.message, "boom");
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            interpreter.run("iserror(error('boom'))"),
            Ok(Value::Boolean(true))
        ));
        assert!(matches!(interpreter.run("iserror(1)"), Ok(Value::Boolean(false))));

        let value = interpreter.run("error('boom', 'MINE').type").unwrap();
        assert_eq!(value.as_str(), Some("MINE"));
        let value = interpreter.run("(1 / 0).message").unwrap();
        assert!(value.as_str().is_some());

        // an error operand is handed through unchanged
        match interpreter.run("(1 / 0) + 5 * 2") {
            Ok(Value::Error(e)) => assert_eq!(e.error_type, error_types::DIVISION_BY_ZERO),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_errors_10_messages_render() {
        let error = Interpreter::new().run("(1").unwrap_err();
        assert_eq!(
            error.to_string(),
            "1 syntax error(s), first: [offset 2] Error: ')' expected"
        );

        let error = eval_error("missing");
        assert_eq!(error.to_string(), "'missing' is not defined");
    }

    #[test]
    fn test_errors_11_space_separated_lists_must_consume_everything() {
        let interpreter = Interpreter::new();
        assert!(matches!(
            interpreter.run_space_separated("1 )"),
            Err(Error::TrailingInput(2))
        ));
        assert!(matches!(
            interpreter.run_space_separated("1 (2"),
            Err(Error::Syntax(_))
        ));

        match interpreter.run_space_separated("1 'a' 2+3") {
            Ok(Value::List(items)) => {
                assert_eq!(items.len(), 3);
                assert!(matches!(items[2], Value::Integer(5)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            interpreter.run_space_separated(""),
            Ok(Value::List(items)) if items.is_empty()
        ));
    }
}
