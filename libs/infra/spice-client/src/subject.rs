// [libs/infra/spice-client/src/subject.rs]
/*!
 * =================================================================
 * APARATO: VALIDACIÓN DE SUJETO DE CERTIFICADO (ESTRATO L3)
 *
 * Reconstruye la cadena "C=...,O=...,CN=..." a partir del DN de sujeto
 * del certificado, en el mismo orden que el proxy original arma desde
 * la tupla `peercert['subject']` de Python, y la compara contra el
 * `host_subject` configurado para la consola.
 * =================================================================
 */

use crate::errors::HypervisorLinkError;
use x509_parser::oid_registry::{OID_X509_COMMON_NAME, OID_X509_COUNTRY_NAME, OID_X509_ORGANIZATION_NAME};
use x509_parser::prelude::*;

/// No-op when `expected` is `None` — some sources configure no
/// `host_subject` at all and rely solely on chain validation (or the
/// permissive [`crate::verifier::AcceptAnyChainVerifier`]).
pub fn enforce_host_subject(der: &[u8], expected: Option<&str>) -> Result<(), HypervisorLinkError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| HypervisorLinkError::Tls(format!("failed to parse hypervisor certificate: {e}")))?;

    let actual = format_subject(&cert);
    if actual != expected {
        return Err(HypervisorLinkError::HostSubjectInvalid {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

fn format_subject(cert: &X509Certificate<'_>) -> String {
    let subject = cert.subject();
    let mut parts = Vec::new();

    for (oid, short) in [
        (&OID_X509_COUNTRY_NAME, "C"),
        (&OID_X509_ORGANIZATION_NAME, "O"),
        (&OID_X509_COMMON_NAME, "CN"),
    ] {
        if let Some(value) = subject.iter_by_oid(oid).next().and_then(|attr| attr.as_str().ok()) {
            parts.push(format!("{short}={value}"));
        }
    }

    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_expectation_is_always_satisfied() {
        assert!(enforce_host_subject(&[], None).is_ok());
    }
}
