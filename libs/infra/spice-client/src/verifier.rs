// [libs/infra/spice-client/src/verifier.rs]
/*!
 * =================================================================
 * APARATO: TLS TRUST POLICY PARA HIPERVISORES (ESTRATO L3)
 *
 * Los hipervisores gestionados casi nunca presentan un certificado cuyo
 * nombre coincida con su IP de administración, así que la validación de
 * nombre estándar de rustls no aplica aquí. Cuando el `Source` no trae
 * un `ca_cert` propio, este verificador acepta la cadena a nivel de
 * transporte y deja que `subject::enforce_host_subject` sea la única
 * puerta de confianza, replicando el chequeo manual de `subject` que
 * hacía el proxy original sobre `peercert['subject']`.
 * =================================================================
 */

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, Error as TlsError, SignatureScheme};
use std::fmt;

pub struct AcceptAnyChainVerifier {
    provider: CryptoProvider,
}

impl AcceptAnyChainVerifier {
    pub fn new() -> Self {
        Self {
            provider: rustls::crypto::ring::default_provider(),
        }
    }
}

impl fmt::Debug for AcceptAnyChainVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcceptAnyChainVerifier").finish()
    }
}

impl ServerCertVerifier for AcceptAnyChainVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}
