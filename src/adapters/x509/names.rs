use x509_parser::x509::{AttributeTypeAndValue, X509Name};

/// Render a distinguished name the way the platform store displays it:
/// most specific RDN first, `, ` between RDNs, ` + ` inside a
/// multi-valued RDN, short attribute names where one exists.
///
/// This rendering is what subject searches compare against, byte for byte.
pub fn render_name(name: &X509Name<'_>) -> String {
    let rdns: Vec<String> = name
        .iter_rdn()
        .map(|rdn| {
            rdn.iter()
                .map(render_attribute)
                .collect::<Vec<_>>()
                .join(" + ")
        })
        .collect();

    rdns.into_iter().rev().collect::<Vec<_>>().join(", ")
}

/// OID of the most specific attribute in the name, empty for an empty name.
pub fn leading_attribute_oid(name: &X509Name<'_>) -> String {
    name.iter_rdn()
        .last()
        .and_then(|rdn| rdn.iter().next())
        .map(|atv| atv.attr_type().to_id_string())
        .unwrap_or_default()
}

fn render_attribute(atv: &AttributeTypeAndValue<'_>) -> String {
    let oid = atv.attr_type().to_id_string();
    let label = match short_name(&oid) {
        Some(short) => short.to_string(),
        None => format!("OID.{oid}"),
    };

    let value = match atv.as_str() {
        Ok(s) => quote_value(s),
        Err(_) => format!("#{}", hex::encode_upper(atv.attr_value().data)),
    };

    format!("{label}={value}")
}

fn short_name(oid: &str) -> Option<&'static str> {
    let short = match oid {
        "2.5.4.3" => "CN",
        "2.5.4.4" => "SN",
        "2.5.4.5" => "SERIALNUMBER",
        "2.5.4.6" => "C",
        "2.5.4.7" => "L",
        "2.5.4.8" => "S",
        "2.5.4.9" => "STREET",
        "2.5.4.10" => "O",
        "2.5.4.11" => "OU",
        "2.5.4.12" => "T",
        "2.5.4.17" => "PostalCode",
        "2.5.4.42" => "G",
        "2.5.4.43" => "I",
        "1.2.840.113549.1.9.1" => "E",
        "0.9.2342.19200300.100.1.25" => "DC",
        _ => return None,
    };
    Some(short)
}

/// Quote a value when it would otherwise be ambiguous in the rendered DN.
fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.starts_with(' ')
        || value.ends_with(' ')
        || value
            .chars()
            .any(|c| matches!(c, ',' | '+' | '=' | '"' | '\n' | '<' | '>' | '#' | ';'));

    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Friendly name of a signature algorithm OID, or the dotted OID itself.
pub fn signature_algorithm_name(oid: &str) -> String {
    let name = match oid {
        "1.2.840.113549.1.1.4" => "md5RSA",
        "1.2.840.113549.1.1.5" => "sha1RSA",
        "1.2.840.113549.1.1.10" => "RSASSA-PSS",
        "1.2.840.113549.1.1.11" => "sha256RSA",
        "1.2.840.113549.1.1.12" => "sha384RSA",
        "1.2.840.113549.1.1.13" => "sha512RSA",
        "1.2.840.10040.4.3" => "sha1DSA",
        "1.2.840.10045.4.1" => "sha1ECDSA",
        "1.2.840.10045.4.3.2" => "sha256ECDSA",
        "1.2.840.10045.4.3.3" => "sha384ECDSA",
        "1.2.840.10045.4.3.4" => "sha512ECDSA",
        "1.3.101.112" => "Ed25519",
        "1.3.101.113" => "Ed448",
        other => return other.to_string(),
    };
    name.to_string()
}
