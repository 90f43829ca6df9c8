mod grammars;

use bnfkit::{build, Grammar};

macro_rules! define_tests {
    ($($name:ident),*$(,)?) => {$(
        #[test]
        fn $name() {
            grammars::init_tracing();
            let grammar = Grammar::define(grammars::$name).unwrap();
            let data = build(grammar).unwrap();
            for state in data.states() {
                eprintln!("{}", state.display(&data));
            }
            eprintln!("{}", data.log());

            assert!(!data.log().has_errors());
            assert!(data.states().len() >= 2);
            assert_ne!(data.initial_state(), data.final_state());
        }
    )*};
}

define_tests! {
    arithmetic,
    layered_expression,
    parens,
    dangling_else,
    dangling_else_preferring_shift,
    reduce_reduce,
    statements,
    select_queries,
}
