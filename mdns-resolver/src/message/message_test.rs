use super::*;

use std::net::Ipv4Addr;

fn name(s: &str) -> Name {
    Name::new(s).unwrap()
}

fn small_response() -> Message {
    Message {
        header: Header {
            response: true,
            authoritative: true,
            ..Default::default()
        },
        questions: vec![Question::new(name("printer.local."), DnsType::A, false)],
        answers: vec![
            Resource::a(name("printer.local."), 120, Ipv4Addr::new(192, 168, 1, 5))
                .with_cache_flush(true),
        ],
        ..Default::default()
    }
}

#[test]
fn test_question_class_bits() {
    for (unicast_response, class) in [(true, [0x80, 0x01]), (false, [0x00, 0x01])] {
        let q = Question::new(name("host.local"), DnsType::A, unicast_response);
        let mut buf = WireBuffer::with_capacity(q.encoded_len());
        q.serialize(&mut buf).unwrap();
        let bytes = buf.into_bytes();
        assert_eq!(&bytes[bytes.len() - 2..], &class);

        let mut buf = WireBuffer::from_bytes(&bytes);
        let got = Question::parse(&mut buf).unwrap();
        assert_eq!(got.unicast_response, unicast_response);
        assert_eq!(got, q);
    }
}

#[test]
fn test_question_rejects_class() {
    let bytes = b"\x04host\x05local\x00\x00\x01\x00\x02";
    let mut buf = WireBuffer::from_bytes(bytes);
    assert_eq!(
        Question::parse(&mut buf),
        Err(Error::ErrUnsupportedClass(2))
    );

    // QU bit on top of a class other than IN.
    let bytes = b"\x04host\x05local\x00\x00\x01\x80\x03";
    let mut buf = WireBuffer::from_bytes(bytes);
    assert_eq!(
        Question::parse(&mut buf),
        Err(Error::ErrUnsupportedClass(0x8003))
    );
}

#[test]
fn test_question_rejects_unknown_type() {
    let bytes = b"\x04host\x05local\x00\xff\x00\x00\x01";
    let mut buf = WireBuffer::from_bytes(bytes);
    assert_eq!(
        Question::parse(&mut buf),
        Err(Error::ErrUnknownType(0xff00))
    );
}

#[test]
fn test_question_len_matches_written() {
    for host in ["a", "host.local", "printer.local.", "a.b.c.d.e.local", "."] {
        let q = Question::new(name(host), DnsType::A, true);
        let mut buf = WireBuffer::with_capacity(512);
        q.serialize(&mut buf).unwrap();
        assert_eq!(q.encoded_len(), buf.written(), "{host}");
    }
}

#[test]
fn test_question_display() {
    let q = Question::new(name("printer.local"), DnsType::A, true);
    assert_eq!(q.to_string(), "A? printer.local. (QU)");
    let q = Question::new(name("printer.local"), DnsType::A, false);
    assert_eq!(q.to_string(), "A? printer.local. (QM)");
}

#[test]
fn test_resource_round_trip() {
    let r = Resource::a(name("Printer.Local"), 4500, Ipv4Addr::new(10, 0, 0, 7))
        .with_cache_flush(true);
    let mut buf = WireBuffer::with_capacity(r.encoded_len());
    r.serialize(&mut buf).unwrap();
    assert_eq!(buf.written(), r.encoded_len());

    let bytes = buf.into_bytes();
    let mut buf = WireBuffer::from_bytes(&bytes);
    let got = Resource::parse(&mut buf).unwrap();
    assert_eq!(got, r);
    assert!(got.cache_flush);
    assert_eq!(got.class, DNSCLASS_INET);
    assert_eq!(got.rdata_as_address_string().unwrap(), "10.0.0.7");
}

#[test]
fn test_resource_rdata_as_address() {
    let r = Resource::new(name("printer.local"), DnsType::A, 120, vec![1, 2, 3]);
    assert_eq!(r.rdata_as_address_string(), Err(Error::ErrInvalidRdata));

    let r = Resource::new(name("printer.local"), DnsType::Aaaa, 120, vec![0; 16]);
    assert_eq!(r.rdata_as_ipv4(), Err(Error::ErrInvalidRdata));
}

#[test]
fn test_resource_rejects_class() {
    // Root name, type A, class CH.
    let bytes = [0, 0, 1, 0, 3, 0, 0, 0, 120, 0, 4, 1, 2, 3, 4];
    let mut buf = WireBuffer::from_bytes(&bytes);
    assert_eq!(
        Resource::parse(&mut buf),
        Err(Error::ErrUnsupportedClass(3))
    );
}

#[test]
fn test_resource_rdata_length_mismatch() {
    // A PTR record whose rdlength claims one byte more than its name.
    let mut bytes = vec![0, 0, 12, 0, 1, 0, 0, 0, 120, 0, 16];
    bytes.extend_from_slice(b"\x07printer\x05local\x00");
    bytes.push(0xAA);
    let mut buf = WireBuffer::from_bytes(&bytes);
    assert_eq!(Resource::parse(&mut buf), Err(Error::ErrInvalidRdata));
}

#[test]
fn test_resource_rdata_short() {
    let bytes = [0, 0, 1, 0, 1, 0, 0, 0, 120, 0, 4, 1, 2];
    let mut buf = WireBuffer::from_bytes(&bytes);
    assert_eq!(Resource::parse(&mut buf), Err(Error::ErrBufferUnderflow));
}

#[test]
fn test_message_round_trip() {
    let msg = Message {
        header: Header {
            response: true,
            authoritative: true,
            ..Default::default()
        },
        questions: vec![Question::new(name("printer._ipp._tcp.local."), DnsType::Ptr, false)],
        answers: vec![
            Resource::from_body(
                name("_ipp._tcp.local."),
                4500,
                &ResourceBody::Ptr(name("printer._ipp._tcp.local.")),
            )
            .unwrap(),
        ],
        authorities: vec![],
        additionals: vec![
            Resource::from_body(
                name("printer._ipp._tcp.local."),
                120,
                &ResourceBody::Srv {
                    priority: 0,
                    weight: 0,
                    port: 631,
                    target: name("printer.local."),
                },
            )
            .unwrap()
            .with_cache_flush(true),
            Resource::from_body(
                name("printer._ipp._tcp.local."),
                4500,
                &ResourceBody::Txt(vec!["txtvers=1".to_owned()]),
            )
            .unwrap(),
            Resource::a(name("printer.local."), 120, Ipv4Addr::new(192, 168, 1, 5)),
        ],
    };

    let bytes = msg.serialize().unwrap();
    assert!(bytes.len() < msg.encoded_len());
    let got = Message::parse(&bytes).unwrap();
    assert_eq!(got, msg);
    assert_eq!(
        got.additionals[0].body().unwrap(),
        ResourceBody::Srv {
            priority: 0,
            weight: 0,
            port: 631,
            target: name("printer.local"),
        }
    );
}

#[test]
fn test_message_compression_across_sections() {
    let msg = small_response();
    let bytes = msg.serialize().unwrap();

    // The answer name right after the question is a pointer to offset 12.
    let answer_off = HEADER_LEN + msg.questions[0].encoded_len();
    assert_eq!(&bytes[answer_off..answer_off + 2], &[0xC0, 0x0C]);
    assert_eq!(bytes.len(), msg.encoded_len() - 13);

    let got = Message::parse(&bytes).unwrap();
    assert_eq!(got.answers[0].name.to_string(), "printer.local.");
    assert_eq!(got, msg);
}

#[test]
fn test_message_raw_labels_in_rdata() {
    let rdatas: Vec<Vec<u8>> = vec![
        b"\x08v2.0 Foo\x00".to_vec(),
        b"\x04Foo.\x00".to_vec(),
        {
            let mut rdata = vec![30u8];
            rdata.extend_from_slice(&[0xff; 30]);
            rdata.push(0);
            rdata
        },
    ];
    let mut answers: Vec<Resource> = rdatas
        .iter()
        .map(|rdata| Resource::new(name("_ipp._tcp.local"), DnsType::Ptr, 120, rdata.clone()))
        .collect();
    answers.push(Resource::a(name("printer.local"), 120, Ipv4Addr::new(192, 168, 1, 5)));
    let msg = Message {
        header: Header {
            response: true,
            ..Default::default()
        },
        answers,
        ..Default::default()
    };

    let got = Message::parse(&msg.serialize().unwrap()).unwrap();
    assert_eq!(got, msg);
    for (answer, rdata) in got.answers.iter().zip(&rdatas) {
        assert_eq!(&answer.rdata, rdata);
    }

    let ResourceBody::Ptr(target) = got.answers[0].body().unwrap() else {
        panic!("expected PTR data");
    };
    assert_eq!(target.labels().len(), 1);
    assert_eq!(target.labels()[0].as_ref(), b"v2.0 Foo");
    assert_eq!(target.to_string(), r"v2\.0 Foo.");
    assert_ne!(target, name("v2.0 Foo"));

    let ResourceBody::Ptr(target) = got.answers[1].body().unwrap() else {
        panic!("expected PTR data");
    };
    assert_eq!(target.labels()[0].as_ref(), b"Foo.");

    // Parsing again after a second serialize still yields the same bytes.
    let again = Message::parse(&got.serialize().unwrap()).unwrap();
    assert_eq!(again.answers[2].rdata, rdatas[2]);
    assert_eq!(again.answers[3].rdata_as_ipv4().unwrap(), Ipv4Addr::new(192, 168, 1, 5));
}

#[test]
fn test_message_parse_compressed_rdata() {
    let mut bytes = Message::mdns_query("printer.local", false)
        .unwrap()
        .serialize()
        .unwrap();
    bytes[7] = 1;
    // PTR answer: name and rdata both point at the question name.
    bytes.extend_from_slice(&[0xC0, 0x0C, 0, 12, 0, 1, 0, 0, 0, 120, 0, 2, 0xC0, 0x0C]);

    let msg = Message::parse(&bytes).unwrap();
    assert_eq!(msg.answers.len(), 1);
    assert_eq!(msg.answers[0].rdata.len(), 15);
    assert_eq!(
        msg.answers[0].body().unwrap(),
        ResourceBody::Ptr(name("printer.local"))
    );
}

#[test]
fn test_message_truncated() {
    let bytes = small_response().serialize().unwrap();
    for cut in [1, 2, 6, bytes.len() - HEADER_LEN] {
        assert_eq!(
            Message::parse(&bytes[..bytes.len() - cut]),
            Err(Error::ErrTruncatedMessage),
            "cut {cut}"
        );
    }
    assert_eq!(Message::parse(&[]), Err(Error::ErrTruncatedMessage));
}

#[test]
fn test_message_count_past_data() {
    let mut bytes = small_response().serialize().unwrap();
    // Claim two answers while only one is present.
    bytes[7] = 2;
    assert_eq!(Message::parse(&bytes), Err(Error::ErrTruncatedMessage));
}

#[test]
fn test_message_trailing_bytes_ignored() {
    let msg = small_response();
    let mut bytes = msg.serialize().unwrap();
    bytes.extend_from_slice(&[0xDE, 0xAD]);
    assert_eq!(Message::parse(&bytes).unwrap(), msg);
}

#[test]
fn test_message_unknown_type_passes_through() {
    let private = Resource {
        name: name("printer.local."),
        rrtype: 65280,
        class: DNSCLASS_INET,
        cache_flush: false,
        ttl: 10,
        rdata: vec![1, 2, 3, 4, 5],
    };
    let mut msg = small_response();
    msg.answers.insert(0, private.clone());

    let got = Message::parse(&msg.serialize().unwrap()).unwrap();
    assert_eq!(got.answers[0], private);
    assert_eq!(got.answers[0].typ(), Err(Error::ErrUnknownType(65280)));
    assert_eq!(
        got.answers[0].body().unwrap(),
        ResourceBody::Unknown(vec![1, 2, 3, 4, 5])
    );
    assert_eq!(got.answers[1].typ(), Ok(DnsType::A));
}

#[test]
fn test_message_opt_additional() {
    let opt = Resource {
        name: Name::default(),
        rrtype: DnsType::Opt.code(),
        class: DnsClass(1440),
        cache_flush: false,
        ttl: 0,
        rdata: vec![],
    };
    let mut msg = small_response();
    msg.additionals.push(opt.clone());

    let got = Message::parse(&msg.serialize().unwrap()).unwrap();
    assert_eq!(got.additionals, vec![opt]);
    assert_eq!(got.additionals[0].class, DnsClass(1440));
}

#[test]
fn test_mdns_query() {
    let query = Message::mdns_query("printer.local", true).unwrap();
    assert_eq!(query.header, Header::default());
    assert_eq!(query.questions.len(), 1);
    assert!(query.answers.is_empty());

    let bytes = query.serialize().unwrap();
    assert_eq!(&bytes[..HEADER_LEN], &[0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0]);
    assert_eq!(Message::parse(&bytes).unwrap(), query);

    assert_eq!(
        Message::mdns_query("", true),
        Err(Error::ErrHostnameEmpty)
    );
    assert_eq!(
        Message::mdns_query("bad..host", true),
        Err(Error::ErrZeroSegLen)
    );
    assert_eq!(
        Message::mdns_query(&"x".repeat(64), true),
        Err(Error::ErrSegTooLong)
    );
}

#[test]
fn test_dns_type_registry() {
    for code in [1u16, 2, 5, 6, 12, 13, 15, 16, 28, 33, 41, 47, 255] {
        assert_eq!(DnsType::try_from(code).unwrap().code(), code);
    }
    assert_eq!(DnsType::try_from(3), Err(Error::ErrUnknownType(3)));
    assert_eq!(DnsType::Srv.to_string(), "SRV");
    assert_eq!(DnsType::Aaaa.to_string(), "AAAA");
}

#[test]
fn test_message_display() {
    let s = small_response().to_string();
    assert!(s.starts_with("dnsmessage.Message{Header: "));
    assert!(s.contains("A? printer.local. (QM)"));
    assert!(s.contains("Data: 192.168.1.5"));
}
