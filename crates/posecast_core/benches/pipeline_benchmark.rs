//! # Pipeline Benchmark
//!
//! The whole per-tick path has to fit comfortably inside a frame on the
//! host thread. This measures:
//! 1. Composition alone, per preset
//! 2. Full tick (compose, encode, checksum, publish) into a live region
//! 3. A validated reader sample
//! 4. Scanning a 1 MiB dump for the record
//!
//! Target: a tick well under 1 microsecond.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use posecast_core::{
    scan, ConventionProfile, Pose, Publisher, ReaderConfig, RegionBacking, RotationComposer, SnapshotReader,
    SlotSource, PRESET_NAMES,
};
use posecast_shared::constants::REGION_BYTES;
use posecast_shared::{EulerDegrees, Quaternion, Vec3};

fn sample_pose() -> Pose {
    Pose::euler(Vec3::new(102.5, -3.25, 41.0), EulerDegrees::new(-12.0, 3.5, 187.25), 58.0)
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    let pose = sample_pose();

    for name in PRESET_NAMES {
        let Ok(profile) = ConventionProfile::preset(name) else {
            continue;
        };
        let composer = RotationComposer::new(profile);
        group.bench_with_input(BenchmarkId::new("euler", name), &pose, |b, pose| {
            b.iter(|| composer.compose(black_box(pose)));
        });
    }

    let composer = RotationComposer::new(ConventionProfile::unity_right_handed());
    let q = Pose::quaternion(
        Vec3::new(1.0, 2.0, 3.0),
        Quaternion::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 33.0),
        60.0,
    );
    group.bench_function("quaternion", |b| {
        b.iter(|| composer.compose(black_box(&q)));
    });

    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    let pose = sample_pose();

    let mut publisher = Publisher::new(ConventionProfile::gtav_open3d(), RegionBacking::Anonymous);
    if publisher.activate().is_err() {
        return;
    }
    let mut source = || Some(pose);
    group.bench_function("anonymous_region", |b| {
        b.iter(|| black_box(publisher.tick(&mut source)));
    });

    let mut missing = || -> Option<Pose> { None };
    group.bench_function("no_pose", |b| {
        b.iter(|| black_box(publisher.tick(&mut missing)));
    });

    group.finish();
    publisher.deactivate();
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");

    let profile = ConventionProfile::identity();
    let mut publisher = Publisher::new(profile.clone(), RegionBacking::Anonymous);
    if publisher.activate().is_err() {
        return;
    }
    publisher.publish(&sample_pose());
    let Some(region) = publisher.region() else {
        return;
    };

    group.bench_function("load_slots", |b| {
        b.iter(|| black_box(region.load_slots()));
    });

    let reader = SnapshotReader::new(region, &profile, ReaderConfig::default());
    group.bench_function("validated_snapshot", |b| {
        b.iter(|| black_box(reader.read()));
    });

    group.finish();
    drop(reader);
    publisher.deactivate();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    let profile = ConventionProfile::identity();
    let slots = RotationComposer::new(profile.clone()).encode(&sample_pose(), 7.0);

    let len = 1 << 20;
    let mut dump = vec![0x5A_u8; len];
    let at = len - REGION_BYTES;
    dump[at..].copy_from_slice(bytemuck::cast_slice(&slots[..]));

    group.throughput(criterion::Throughput::Bytes(len as u64));
    group.bench_function("locate_record_1mib", |b| {
        b.iter(|| scan::locate_record(black_box(&dump), profile.marker));
    });

    group.finish();
}

criterion_group!(benches, bench_compose, bench_tick, bench_read, bench_scan);
criterion_main!(benches);
