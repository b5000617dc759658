/// Declares a test over a fresh in-memory context seeded with the sample data.
///
/// ```ignore
/// context_test!(finds_member1, |ctx, data| {
///     let m = QMember::member();
///     let found = Query::select_from(&m).fetch(&mut ctx)?;
/// });
/// ```
#[macro_export]
macro_rules! context_test {
    ($name:ident, |$ctx:ident, $data:pat_param| $body:block) => {
        #[test]
        fn $name() -> ::quarry::Result<()> {
            let mut $ctx = $crate::common::setup_context();
            let $data = ::quarry::sample::seed(&mut $ctx)?;
            $body
            Ok(())
        }
    };
}

/// Flushes staged writes and clears the context.
#[macro_export]
macro_rules! flush_and_clear {
    ($ctx:expr) => {{
        $ctx.flush()?;
        $ctx.clear();
    }};
}
