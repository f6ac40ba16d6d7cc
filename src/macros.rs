/// Generate a `#[test]` per listed function that runs the function against
/// every backend, in turn, each built from its default configuration with a
/// fixed hash seed. The function takes a `FibBackend` and returns a
/// `Result<(), Box<dyn std::error::Error>>`.
#[macro_export]
#[doc(hidden)]
macro_rules! all_backends {
    ( $( $fn_name: ident; $test_name: ident ), * ) => {

        $(
            #[test]
            fn $fn_name() -> Result<(), Box<dyn std::error::Error>> {
                for kind in $crate::fib::config::BackendKind::ALL {
                    println!("{} backend starting...", kind);
                    let mut config =
                        $crate::fib::config::FibConfig::default_for(kind);
                    config.set_seed(42);
                    let fib = config.build()?;

                    $test_name(fib)?;
                }

                Ok(())
            }
        )*
    };
}
