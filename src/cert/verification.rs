// src/cert/verification.rs
use super::operations::{CertOperationError, IssuedBundle, IssuedCertificate};
use super::types::AltName;
use crate::utils::logging::Logger;
use chrono::{DateTime, TimeZone, Utc};
use openssl::pkey::PKey;
use openssl::x509::X509;
use serde::Serialize;
use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use std::{fs, io};
use x509_parser::prelude::{FromDer, GeneralName, ParsedExtension, X509Certificate};

#[derive(Debug, Serialize, Clone)]
pub struct CertificateInfo {
    pub path: PathBuf,
    pub subject: String,
    pub common_name: Option<String>,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub serial: String,
    pub fingerprint: String,
    pub is_ca: bool,
    pub server_auth: bool,
    pub client_auth: bool,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
}

impl CertificateInfo {
    fn alt_names(&self) -> BTreeSet<AltName> {
        self.dns_names
            .iter()
            .cloned()
            .map(AltName::Dns)
            .chain(self.ip_addresses.iter().copied().map(AltName::Ip))
            .collect()
    }
}

fn timestamp(seconds: i64) -> io::Result<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Invalid certificate timestamp"))
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(|b| IpAddr::V4(Ipv4Addr::from(b))),
        16 => <[u8; 16]>::try_from(bytes).ok().map(|b| IpAddr::V6(Ipv6Addr::from(b))),
        _ => None,
    }
}

pub fn analyze_certificate(path: &Path) -> io::Result<CertificateInfo> {
    let cert_pem = fs::read(path)?;

    let cert_der = if cert_pem.starts_with(b"-----BEGIN CERTIFICATE-----") {
        X509::from_pem(&cert_pem)
            .and_then(|cert| cert.to_der())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
    } else {
        cert_pem
    };

    let (_remainder, cert) = X509Certificate::from_der(&cert_der)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    let mut info = CertificateInfo {
        path: path.to_path_buf(),
        subject: cert.subject().to_string(),
        common_name: cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(str::to_string),
        issuer: cert.issuer().to_string(),
        not_before: timestamp(cert.validity().not_before.timestamp())?,
        not_after: timestamp(cert.validity().not_after.timestamp())?,
        serial: hex::encode(cert.raw_serial()),
        fingerprint: hex::encode(openssl::hash::hash(
            openssl::hash::MessageDigest::sha256(),
            &cert_der,
        )?),
        is_ca: false,
        server_auth: false,
        client_auth: false,
        dns_names: Vec::new(),
        ip_addresses: Vec::new(),
    };

    for ext in cert.extensions() {
        match ext.parsed_extension() {
            ParsedExtension::BasicConstraints(bc) => info.is_ca = bc.ca,
            ParsedExtension::ExtendedKeyUsage(eku) => {
                info.server_auth = eku.server_auth;
                info.client_auth = eku.client_auth;
            }
            ParsedExtension::SubjectAlternativeName(san) => {
                for name in &san.general_names {
                    match name {
                        GeneralName::DNSName(dns) => info.dns_names.push(dns.to_string()),
                        GeneralName::IPAddress(bytes) => {
                            if let Some(ip) = ip_from_bytes(bytes) {
                                info.ip_addresses.push(ip);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    Ok(info)
}

/// Lists every `.crt` file below `root`, sorted.
pub fn discover_certificates(root: &Path) -> Result<Vec<PathBuf>, CertOperationError> {
    let root = glob::Pattern::escape(&root.display().to_string());
    let pattern = format!("{}/**/*.crt", root);
    let entries = glob::glob(&pattern).map_err(|e| {
        CertOperationError::Verification(format!("Glob pattern error: {}", e))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CertOperationError::IoError(e.into()))?;
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

fn check_issued(
    issued: &IssuedCertificate,
    info: &CertificateInfo,
    ca: &X509,
) -> Result<(), String> {
    let request = &issued.request;
    let role = request.role();

    if info.is_ca {
        return Err("leaf certificate is marked as a CA".to_string());
    }
    if info.server_auth != role.server_auth() || info.client_auth != role.client_auth() {
        return Err(format!(
            "EKU mismatch for {} role: serverAuth={}, clientAuth={}",
            role, info.server_auth, info.client_auth
        ));
    }

    let expected: BTreeSet<AltName> = request.alt_names().into_iter().collect();
    let actual = info.alt_names();
    if expected != actual {
        let render = |set: &BTreeSet<AltName>| {
            set.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ")
        };
        return Err(format!(
            "SAN mismatch: expected [{}], found [{}]",
            render(&expected),
            render(&actual)
        ));
    }

    if info.common_name.as_deref() != Some(request.common_name()) {
        return Err(format!(
            "subject CN {:?} does not match {:?}",
            info.common_name,
            request.common_name()
        ));
    }

    let cert = load_pem(&issued.cert_path).map_err(|e| e.to_string())?;
    if !key_matches(&cert, &issued.key_path).map_err(|e| e.to_string())? {
        return Err(format!(
            "{} does not belong to the certificate",
            issued.key_path.display()
        ));
    }

    let ca_key = ca.public_key().map_err(|e| e.to_string())?;
    match cert.verify(&ca_key) {
        Ok(true) => Ok(()),
        Ok(false) => Err("signature does not verify against the CA".to_string()),
        Err(e) => Err(format!("signature check failed: {}", e)),
    }
}

fn load_pem(path: &Path) -> Result<X509, CertOperationError> {
    let pem = fs::read(path)?;
    Ok(X509::from_pem(&pem)?)
}

fn key_matches(cert: &X509, key_path: &Path) -> Result<bool, CertOperationError> {
    let key = PKey::private_key_from_pem(&fs::read(key_path)?)?;
    Ok(cert.public_key()?.public_eq(&key))
}

/// Re-reads every issued certificate and checks it carries exactly the EKUs,
/// SANs and subject its request asked for, signed by the bundle's CA.
pub fn verify_bundle(
    bundle: &IssuedBundle,
    logger: &mut dyn Logger,
) -> Result<Vec<CertificateInfo>, CertOperationError> {
    logger.log(&format!(
        "Verifying {} certificates in {}",
        bundle.certificates.len(),
        bundle.root.display()
    ));

    let on_disk = discover_certificates(&bundle.root)?;
    logger.debug_log(&format!("Found {} certificate files", on_disk.len()));
    for issued in &bundle.certificates {
        if !on_disk.contains(&issued.cert_path) {
            return Err(CertOperationError::Verification(format!(
                "{} is missing from {}",
                issued.cert_path.display(),
                bundle.root.display()
            )));
        }
    }

    let ca = load_pem(&bundle.ca_cert)?;
    if !key_matches(&ca, &bundle.ca_key)? {
        return Err(CertOperationError::Verification(format!(
            "{} does not belong to {}",
            bundle.ca_key.display(),
            bundle.ca_cert.display()
        )));
    }

    let mut infos = Vec::with_capacity(bundle.certificates.len());
    for issued in &bundle.certificates {
        let info = analyze_certificate(&issued.cert_path)?;
        check_issued(issued, &info, &ca).map_err(|reason| {
            logger.log(&format!(
                "Certificate {} failed verification: {}",
                issued.request.name(),
                reason
            ));
            CertOperationError::Verification(format!("{}: {}", issued.request.name(), reason))
        })?;
        let summary = serde_json::to_string(&info)
            .map_err(|e| CertOperationError::Verification(e.to_string()))?;
        logger.debug_log(&format!("{} ok: {}", issued.request.name(), summary));
        infos.push(info);
    }

    logger.log("All certificates match their requests");
    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::openssl::OpenSslSigner;
    use crate::cert::operations::CertificateSigner;
    use crate::cert::planner::ScenarioPlanner;
    use crate::cert::scenario::ScenarioId;
    use crate::cert::types::CertificateRequest;
    use crate::network::NodeAddress;
    use crate::utils::logging::tests::MockLogger;
    use tempfile::TempDir;

    fn issue(selector: i64, dir: &Path) -> IssuedBundle {
        let nodes: Vec<NodeAddress> = vec!["172.19.0.2".parse().unwrap()];
        let plan = ScenarioPlanner::default().plan(&nodes, ScenarioId::from_selector(selector));
        OpenSslSigner::new(2048)
            .complete(plan, dir, &mut MockLogger::default())
            .unwrap()
    }

    #[test]
    fn every_scenario_verifies() {
        for selector in 1..=4 {
            let temp_dir = TempDir::new().unwrap();
            let bundle = issue(selector, temp_dir.path());
            let mut logger = MockLogger::default();
            let infos = verify_bundle(&bundle, &mut logger).unwrap();
            assert_eq!(infos.len(), bundle.certificates.len());
            assert!(logger.logs.last().unwrap().contains("match"));
        }
    }

    #[test]
    fn analyze_reports_eku_and_sans() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = issue(4, temp_dir.path());
        let serving = bundle
            .certificates
            .iter()
            .find(|c| c.request.name() == "172.19.0.2-serving")
            .unwrap();

        let info = analyze_certificate(&serving.cert_path).unwrap();
        assert!(info.server_auth && info.client_auth);
        assert!(!info.is_ca);
        assert_eq!(info.common_name.as_deref(), Some("etcd-serving"));
        assert_eq!(info.dns_names, vec!["localhost".to_string()]);
        assert_eq!(
            info.ip_addresses,
            vec![
                "127.0.0.1".parse::<IpAddr>().unwrap(),
                "172.19.0.2".parse().unwrap()
            ]
        );
        assert_eq!(info.fingerprint.len(), 64);
        assert!((info.not_after - info.not_before).num_days() >= 9);

        let ca = analyze_certificate(&bundle.ca_cert).unwrap();
        assert!(ca.is_ca);
        assert_eq!(ca.common_name.as_deref(), Some("etcdsigner-2"));
    }

    #[test]
    fn mismatched_request_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut bundle = issue(2, temp_dir.path());

        // claim the server-only peer cert was meant to be dual-role
        let peer = bundle
            .certificates
            .iter_mut()
            .find(|c| c.request.name() == "172.19.0.2-peer")
            .unwrap();
        peer.request = CertificateRequest::peer(
            "172.19.0.2-peer",
            10,
            "localhost",
            peer.request.hostnames().to_vec(),
        );

        let err = verify_bundle(&bundle, &mut MockLogger::default()).unwrap_err();
        assert!(matches!(err, CertOperationError::Verification(ref m) if m.contains("EKU")));
    }

    #[test]
    fn missing_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = issue(1, temp_dir.path());
        fs::remove_file(&bundle.certificates[1].cert_path).unwrap();

        let err = verify_bundle(&bundle, &mut MockLogger::default()).unwrap_err();
        assert!(matches!(err, CertOperationError::Verification(ref m) if m.contains("missing")));
    }

    #[test]
    fn discovery_finds_nested_certificates() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = issue(3, temp_dir.path());
        let found = discover_certificates(temp_dir.path()).unwrap();
        // CA plus one file per request
        assert_eq!(found.len(), bundle.certificates.len() + 1);
        assert!(found.contains(&bundle.ca_cert));
    }

    #[test]
    fn root_with_glob_metacharacters_verifies() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("certs[1]*?");
        let bundle = issue(1, &root);

        let found = discover_certificates(&root).unwrap();
        assert_eq!(found.len(), bundle.certificates.len() + 1);
        verify_bundle(&bundle, &mut MockLogger::default()).unwrap();
    }

    #[test]
    fn debug_log_carries_certificate_details() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = issue(1, temp_dir.path());
        let mut logger = MockLogger::default();
        verify_bundle(&bundle, &mut logger).unwrap();

        let client = &bundle.certificates[0];
        let line = logger
            .logs
            .iter()
            .find(|l| l.starts_with("DEBUG: client ok: "))
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(line.trim_start_matches("DEBUG: client ok: ")).unwrap();
        assert_eq!(json["path"], client.cert_path.display().to_string());
        assert_eq!(json["common_name"], "etcd-client");
        assert_eq!(json["client_auth"], true);
        assert_eq!(json["server_auth"], false);
    }
}
