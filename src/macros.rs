//! Application level macroses

/// Macros for building `ValidationErrors` out of field/code/message
/// literals in service code.
#[macro_export]
macro_rules! validation_errors {
    ({$($field:tt: [$($code:tt => $message:tt),*]),*}) => {{
        let mut errors = ::validator::ValidationErrors::new();
        $($(
            errors.add(
                $field,
                ::validator::ValidationError {
                    code: ::std::borrow::Cow::from($code),
                    message: Some(::std::borrow::Cow::from($message)),
                    params: ::std::collections::HashMap::new(),
                },
            );
        )*)*
        errors
    }};
}
