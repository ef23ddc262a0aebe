use boleta_extract::parse_message;

#[test]
fn test_parse_plain_email() {
    let raw = b"From: Aguas Andinas <contacto@aguasandinas.cl>\r\n\
                Subject: Tu boleta ya esta disponible\r\n\
                Date: Mon, 05 Jan 2026 09:30:00 -0300\r\n\
                \r\n\
                Total a pagar: $24.580";

    let email = parse_message(raw).unwrap();

    assert_eq!(email.from.address, "contacto@aguasandinas.cl");
    assert_eq!(email.from.name.as_deref(), Some("Aguas Andinas"));
    assert_eq!(email.subject, "Tu boleta ya esta disponible");
    assert!(email.body_text.contains("Total a pagar"));
    assert!(email.sent_at.is_some());
    assert!(!email.has_attachments);
}

#[test]
fn test_multipart_prefers_plain_text() {
    let raw = b"From: boleta@metrogas.cl\r\n\
                Subject: Boleta\r\n\
                MIME-Version: 1.0\r\n\
                Content-Type: multipart/alternative; boundary=\"frontera\"\r\n\
                \r\n\
                --frontera\r\n\
                Content-Type: text/plain; charset=utf-8\r\n\
                \r\n\
                cuerpo plano\r\n\
                --frontera\r\n\
                Content-Type: text/html; charset=utf-8\r\n\
                \r\n\
                <p>cuerpo html</p>\r\n\
                --frontera--\r\n";

    let email = parse_message(raw).unwrap();

    assert!(email.body_text.contains("cuerpo plano"));
    assert!(!email.body_text.contains("html"));
}

#[test]
fn test_html_only_is_stripped() {
    let raw = b"From: boleta@metrogas.cl\r\n\
                Subject: Boleta\r\n\
                Content-Type: text/html; charset=utf-8\r\n\
                \r\n\
                <html><body><table><tr><td>Total a pagar</td>\
                <td>24580</td></tr></table></body></html>";

    let email = parse_message(raw).unwrap();

    assert!(email.body_text.contains("Total a pagar"));
    assert!(!email.body_text.contains('<'));
}

#[test]
fn test_double_encoded_entities_resolve_fully() {
    // The provider escaped its entities twice: the ampersand of
    // "&oacute;" arrives as "&amp;".
    let raw = b"From: contacto@aguasandinas.cl\r\n\
                Subject: Boleta\r\n\
                Content-Type: text/html\r\n\
                \r\n\
                <p>Direcci&amp;oacute;n: AV SIEMPRE VIVA 742</p>";

    let email = parse_message(raw).unwrap();

    assert!(email.body_text.contains("Dirección"));
    assert!(!email.body_text.contains("oacute"));
}

#[test]
fn test_attachment_is_detected_and_skipped_as_body() {
    let raw = b"From: boleta@metrogas.cl\r\n\
                Subject: Boleta\r\n\
                MIME-Version: 1.0\r\n\
                Content-Type: multipart/mixed; boundary=\"frontera\"\r\n\
                \r\n\
                --frontera\r\n\
                Content-Type: text/plain\r\n\
                \r\n\
                Adjuntamos tu boleta.\r\n\
                --frontera\r\n\
                Content-Type: application/pdf\r\n\
                Content-Disposition: attachment; filename=\"boleta.pdf\"\r\n\
                \r\n\
                %PDF-1.4 fake\r\n\
                --frontera--\r\n";

    let email = parse_message(raw).unwrap();

    assert!(email.has_attachments);
    assert!(email.body_text.contains("Adjuntamos"));
    assert!(!email.body_text.contains("PDF-1.4"));
}

#[test]
fn test_missing_from_header_yields_empty_sender() {
    let raw = b"Subject: Boleta\r\n\
                \r\n\
                cuerpo";

    let email = parse_message(raw).unwrap();

    assert_eq!(email.from.address, "");
    assert_eq!(email.from.domain, "");
}

#[test]
fn test_missing_date_header_yields_none() {
    let raw = b"From: a@b.cl\r\n\
                Subject: Boleta\r\n\
                \r\n\
                cuerpo";

    let email = parse_message(raw).unwrap();

    assert!(email.sent_at.is_none());
}

#[test]
fn test_no_text_parts_yields_empty_body() {
    let raw = b"From: a@b.cl\r\n\
                Subject: Boleta\r\n\
                Content-Type: application/pdf\r\n\
                Content-Disposition: attachment; filename=\"x.pdf\"\r\n\
                \r\n\
                %PDF-1.4";

    let email = parse_message(raw).unwrap();

    assert_eq!(email.body_text, "");
    assert!(email.has_attachments);
}

#[test]
fn test_encoded_word_subject_is_decoded() {
    let raw = b"From: enel@enel.cl\r\n\
                Subject: =?UTF-8?Q?Tu_Boleta_Electr=C3=B3nica?=\r\n\
                \r\n\
                cuerpo";

    let email = parse_message(raw).unwrap();

    assert_eq!(email.subject, "Tu Boleta Electrónica");
}
