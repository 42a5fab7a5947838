//! Build parameter checks against a job's declared parameters.

use crate::{Error, JobConfig};

/// Reject requested values that a choice-constrained definition does not allow.
///
/// Only definitions with a non-empty `choices` list are checked, and only when the request
/// carries that key. Requested keys without a definition are left to the caller.
pub fn validate<'a, I, K, V>(config: &JobConfig, requested: I) -> Result<(), Error>
where
    I: IntoIterator<Item = (&'a K, &'a V)>,
    K: AsRef<str> + ?Sized + 'a,
    V: AsRef<str> + ?Sized + 'a,
{
    let requested: Vec<(&str, &str)> = requested
        .into_iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .collect();

    for definition in &config.parameter_definitions {
        let Some(choices) = definition.choices.as_deref().filter(|c| !c.is_empty()) else {
            continue;
        };
        let Some((_, value)) = requested.iter().find(|(k, _)| *k == definition.name) else {
            continue;
        };
        if !choices.iter().any(|choice| choice == value) {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                job = %config.name,
                parameter = %definition.name,
                value = %value,
                "rejected job parameter"
            );
            return Err(Error::InvalidJobParameter {
                name: definition.name.as_str().into(),
                value: (*value).into(),
                choices: choices.to_vec(),
            });
        }
    }
    Ok(())
}
