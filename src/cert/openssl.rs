// src/cert/openssl.rs
use super::operations::{CertOperationError, CertificateSigner, IssuedBundle, IssuedCertificate};
use super::types::{AltName, CertificateRequest, IssuancePlan, SignerIdentity};
use crate::utils::logging::Logger;
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage,
    SubjectAlternativeName, SubjectKeyIdentifier,
};
use openssl::x509::{X509Builder, X509Name, X509NameBuilder, X509Ref, X509};
use std::{fs, path::Path};

pub const CA_CERT_FILE: &str = "ca.crt";
pub const CA_KEY_FILE: &str = "ca.key";

/// Signs plans in-process with RSA keys and SHA-256.
#[derive(Debug, Clone, Copy)]
pub struct OpenSslSigner {
    key_size: u32,
}

impl OpenSslSigner {
    pub fn new(key_size: u32) -> Self {
        Self { key_size }
    }
}

fn generate_private_key(
    key_size: u32,
    logger: &mut dyn Logger,
) -> Result<PKey<Private>, CertOperationError> {
    logger.debug_log(&format!("Generating {}-bit RSA key", key_size));
    let rsa = Rsa::generate(key_size)?;
    Ok(PKey::from_rsa(rsa)?)
}

fn common_name(cn: &str) -> Result<X509Name, CertOperationError> {
    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_text("CN", cn)?;
    Ok(name.build())
}

fn new_builder(
    subject: &X509Name,
    key: &PKey<Private>,
    validity_days: u32,
) -> Result<X509Builder, CertOperationError> {
    let mut builder = X509Builder::new()?;
    builder.set_version(2)?;

    let mut serial = BigNum::new()?;
    serial.rand(159, MsbOption::MAYBE_ZERO, false)?;
    let serial = serial.to_asn1_integer()?;
    builder.set_serial_number(&serial)?;

    builder.set_subject_name(subject)?;
    builder.set_pubkey(key)?;
    let not_before = Asn1Time::days_from_now(0)?;
    let not_after = Asn1Time::days_from_now(validity_days)?;
    builder.set_not_before(&not_before)?;
    builder.set_not_after(&not_after)?;
    Ok(builder)
}

fn create_ca(signer: &SignerIdentity, key: &PKey<Private>) -> Result<X509, CertOperationError> {
    let subject = common_name(&signer.name)?;
    let mut builder = new_builder(&subject, key, signer.validity_days)?;
    builder.set_issuer_name(&subject)?;

    builder.append_extension(BasicConstraints::new().critical().ca().build()?)?;
    builder.append_extension(
        KeyUsage::new()
            .critical()
            .key_cert_sign()
            .crl_sign()
            .digital_signature()
            .key_encipherment()
            .build()?,
    )?;
    let ski = SubjectKeyIdentifier::new().build(&builder.x509v3_context(None, None))?;
    builder.append_extension(ski)?;

    builder.sign(key, MessageDigest::sha256())?;
    Ok(builder.build())
}

fn sign_leaf(
    request: &CertificateRequest,
    key: &PKey<Private>,
    ca_cert: &X509Ref,
    ca_key: &PKey<Private>,
) -> Result<X509, CertOperationError> {
    let subject = common_name(request.common_name())?;
    let mut builder = new_builder(&subject, key, request.validity_days())?;
    builder.set_issuer_name(ca_cert.subject_name())?;

    builder.append_extension(BasicConstraints::new().critical().build()?)?;
    builder.append_extension(
        KeyUsage::new()
            .critical()
            .digital_signature()
            .key_encipherment()
            .build()?,
    )?;

    let role = request.role();
    let mut eku = ExtendedKeyUsage::new();
    if role.server_auth() {
        eku.server_auth();
    }
    if role.client_auth() {
        eku.client_auth();
    }
    builder.append_extension(eku.build()?)?;

    let alt_names = request.alt_names();
    if !alt_names.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for alt_name in &alt_names {
            match alt_name {
                AltName::Dns(name) => san.dns(name),
                AltName::Ip(ip) => san.ip(&ip.to_string()),
            };
        }
        let san = san.build(&builder.x509v3_context(Some(ca_cert), None))?;
        builder.append_extension(san)?;
    }

    let ski = SubjectKeyIdentifier::new().build(&builder.x509v3_context(Some(ca_cert), None))?;
    builder.append_extension(ski)?;
    let aki = AuthorityKeyIdentifier::new()
        .keyid(false)
        .build(&builder.x509v3_context(Some(ca_cert), None))?;
    builder.append_extension(aki)?;

    builder.sign(ca_key, MessageDigest::sha256())?;
    Ok(builder.build())
}

fn write_certificate(path: &Path, cert: &X509) -> Result<(), CertOperationError> {
    fs::write(path, cert.to_pem()?)?;
    Ok(())
}

fn write_private_key(path: &Path, key: &PKey<Private>) -> Result<(), CertOperationError> {
    fs::write(path, key.private_key_to_pem_pkcs8()?)?;

    // Set proper permissions
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

impl CertificateSigner for OpenSslSigner {
    fn complete(
        &self,
        plan: IssuancePlan,
        dir: &Path,
        logger: &mut dyn Logger,
    ) -> Result<IssuedBundle, CertOperationError> {
        let signer = plan.signer();
        logger.log(&format!(
            "Creating signer {} in {}",
            signer.name,
            dir.display()
        ));
        fs::create_dir_all(dir)?;

        let ca_key = generate_private_key(self.key_size, logger)?;
        let ca_cert = create_ca(signer, &ca_key).map_err(|e| {
            CertOperationError::CertGeneration(format!("CA {}: {}", signer.name, e))
        })?;

        let ca_cert_path = dir.join(CA_CERT_FILE);
        let ca_key_path = dir.join(CA_KEY_FILE);
        write_certificate(&ca_cert_path, &ca_cert)?;
        write_private_key(&ca_key_path, &ca_key)?;
        logger.debug_log(&format!("CA written to {}", ca_cert_path.display()));

        let mut certificates = Vec::with_capacity(plan.requests().len());
        for request in plan.requests() {
            logger.log(&format!(
                "Issuing {} certificate {}",
                request.role(),
                request.name()
            ));

            let cert_dir = dir.join(request.name());
            fs::create_dir_all(&cert_dir)?;

            let key = generate_private_key(self.key_size, logger)?;
            let cert = sign_leaf(request, &key, &ca_cert, &ca_key).map_err(|e| {
                CertOperationError::CertGeneration(format!("{}: {}", request.name(), e))
            })?;

            let stem = request.role().file_stem();
            let cert_path = cert_dir.join(format!("{}.crt", stem));
            let key_path = cert_dir.join(format!("{}.key", stem));
            write_certificate(&cert_path, &cert)?;
            write_private_key(&key_path, &key)?;
            logger.debug_log(&format!(
                "cert_path:{}, key_path:{}",
                cert_path.display(),
                key_path.display()
            ));

            certificates.push(IssuedCertificate {
                request: request.clone(),
                cert_path,
                key_path,
            });
        }

        logger.log(&format!("Issued {} certificates", certificates.len()));
        Ok(IssuedBundle {
            root: dir.to_path_buf(),
            ca_cert: ca_cert_path,
            ca_key: ca_key_path,
            certificates,
        })
    }
}
