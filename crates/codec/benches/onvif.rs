use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use onvif_timestamp_codec::{Extension, ONVIF_PROFILE, OnvifExtension, Rtp, convert};

fn criterion_benchmark(c: &mut Criterion) {
    #[rustfmt::skip]
    let packet = [
        0x80, 0x60, 0x04, 0xf1, 0xf8, 0x87, 0x3f, 0xad, 0x67, 0xfe, 0x9d, 0xfc,
        0x65, 0x88, 0x84, 0x00, 0x21, 0xff, 0xf0, 0x42, 0x6a, 0x11, 0x00, 0x00,
    ];

    let mut onvif_criterion = c.benchmark_group("onvif");

    onvif_criterion.throughput(Throughput::Elements(1));
    onvif_criterion.bench_function("apply_extension", |bencher| {
        let mut pts = 0;

        bencher.iter(|| {
            pts += 33_333_333;

            let data = OnvifExtension {
                ntp_time: convert(Some(pts), 3_913_056_000).unwrap(),
                clean_point: true,
                end_contiguous: false,
                discont: false,
                cseq: pts as u8,
            }
            .encode();

            Rtp::decode(&packet)
                .unwrap()
                .with_extension(Some(Extension {
                    profile: ONVIF_PROFILE,
                    data: &data,
                }))
                .to_bytes()
                .unwrap()
        })
    });

    onvif_criterion.bench_function("parse_extension", |bencher| {
        let data = OnvifExtension::default().encode();
        let tagged = Rtp::decode(&packet)
            .unwrap()
            .with_extension(Some(Extension {
                profile: ONVIF_PROFILE,
                data: &data,
            }))
            .to_bytes()
            .unwrap();

        bencher.iter(|| {
            let rtp = Rtp::decode(&tagged).unwrap();
            let extension = OnvifExtension::from_extension(&rtp.extension.unwrap()).unwrap();
            (extension, rtp.with_extension(None).to_bytes().unwrap())
        })
    });

    onvif_criterion.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
