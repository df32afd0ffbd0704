//! Benchmarks for the wire codec.
//!
//! Run with: cargo bench

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ferry::dns;

fn encode_name(buf: &mut Vec<u8>, domain: &str) {
    for label in domain.split('.') {
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
}

fn build_query(domain: &str) -> Vec<u8> {
    let mut packet = Vec::with_capacity(512);

    packet.extend_from_slice(&0x1234u16.to_be_bytes());
    packet.extend_from_slice(&[0x01, 0x00]); // Flags: standard query
    packet.extend_from_slice(&[0x00, 0x01]); // Questions: 1
    packet.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

    encode_name(&mut packet, domain);
    packet.extend_from_slice(&[0x00, 0x01]); // Type: A
    packet.extend_from_slice(&[0x00, 0x01]); // Class: IN

    packet
}

fn build_response(domain: &str, records: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(512);

    packet.extend_from_slice(&0x1234u16.to_be_bytes());
    packet.extend_from_slice(&[0x81, 0x80]); // Flags: response, RA
    packet.extend_from_slice(&[0x00, 0x01]); // Questions: 1
    packet.extend_from_slice(&(records.len() as u16).to_be_bytes());
    packet.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

    encode_name(&mut packet, domain);
    packet.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);

    for (rtype, rdata) in records {
        packet.extend_from_slice(&[0xC0, 0x0C]); // Name: pointer to question
        packet.extend_from_slice(&rtype.to_be_bytes());
        packet.extend_from_slice(&[0x00, 0x01]); // Class: IN
        packet.extend_from_slice(&300u32.to_be_bytes());
        packet.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        packet.extend_from_slice(rdata);
    }

    packet
}

fn bench_query_name(c: &mut Criterion) {
    let short = build_query("example.com");
    let long = build_query("deep.chain.of.labels.under.example.com");

    c.bench_function("query_name_short", |b| {
        b.iter(|| dns::query_name(black_box(&short)))
    });

    c.bench_function("query_name_long", |b| {
        b.iter(|| dns::query_name(black_box(&long)))
    });
}

fn bench_first_ipv4_answer(c: &mut Criterion) {
    let direct = build_response("example.com", &[(1, vec![93, 184, 216, 34])]);

    let mut cname_rdata = Vec::new();
    encode_name(&mut cname_rdata, "cdn.example.com");
    let behind_cname = build_response(
        "example.com",
        &[(5, cname_rdata), (1, vec![93, 184, 216, 34])],
    );

    c.bench_function("first_ipv4_answer_direct", |b| {
        b.iter(|| dns::first_ipv4_answer(black_box(&direct)))
    });

    c.bench_function("first_ipv4_answer_behind_cname", |b| {
        b.iter(|| dns::first_ipv4_answer(black_box(&behind_cname)))
    });
}

criterion_group!(benches, bench_query_name, bench_first_ipv4_answer);
criterion_main!(benches);
