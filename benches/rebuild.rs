use criterion::{Criterion, black_box, criterion_group, criterion_main};

use voxmesh::build::{BuildOptions, MeshBuilder, WorkQueue};
use voxmesh::core::MeshConfig;
use voxmesh::lattice::{Lattice, VoxelCoordinate};
use voxmesh::mesh::{IntermediateMeshData, PointOffsets, assemble, decompose_voxel};
use voxmesh::voxel::{Voxel, VoxelMaterial, VoxelStore};

fn solid_box(edge: i32) -> Vec<Voxel> {
    let mut voxels = Vec::new();
    for x in 0..edge {
        for y in 0..edge {
            for z in 0..edge {
                voxels.push(Voxel::new(
                    VoxelCoordinate::new(0, x, y, z),
                    VoxelMaterial::default(),
                ));
            }
        }
    }
    voxels
}

fn solid_box_store(edge: i32) -> VoxelStore {
    let mut store = VoxelStore::new(Lattice::default());
    for voxel in solid_box(edge) {
        store.insert_if_free(voxel);
    }
    store.invalidate();
    store
}

fn bench_rebuild_8(c: &mut Criterion) {
    let store = solid_box_store(8);
    let queue = WorkQueue::new();
    let builder = MeshBuilder::new(1, MeshConfig::default(), queue.handle());

    c.bench_function("rebuild_immediate_8", |b| {
        b.iter(|| {
            builder
                .start(black_box(&store), BuildOptions::default())
                .unwrap();
            black_box(builder.committed())
        });
    });
}

fn bench_rebuild_12(c: &mut Criterion) {
    let store = solid_box_store(12);
    let queue = WorkQueue::new();
    let builder = MeshBuilder::new(1, MeshConfig::default(), queue.handle());

    c.bench_function("rebuild_immediate_12", |b| {
        b.iter(|| {
            builder
                .start(black_box(&store), BuildOptions::default())
                .unwrap();
            black_box(builder.committed())
        });
    });
}

fn bench_decompose_512(c: &mut Criterion) {
    let lattice = Lattice::default();
    let voxels = solid_box(8);

    c.bench_function("decompose_512", |b| {
        b.iter(|| {
            let mut data = IntermediateMeshData::new(Vec::new());
            for voxel in &voxels {
                decompose_voxel(black_box(&lattice), voxel, &mut data).unwrap();
            }
            black_box(data.face_count())
        });
    });
}

fn bench_assemble_512(c: &mut Criterion) {
    let lattice = Lattice::default();
    let mut data = IntermediateMeshData::new(Vec::new());
    for voxel in solid_box(8) {
        decompose_voxel(&lattice, &voxel, &mut data).unwrap();
    }

    c.bench_function("assemble_512", |b| {
        b.iter(|| {
            let output = assemble(black_box(&data), lattice, PointOffsets::new());
            black_box(output.vertex_count())
        });
    });
}

criterion_group!(
    benches,
    bench_rebuild_8,
    bench_rebuild_12,
    bench_decompose_512,
    bench_assemble_512,
);
criterion_main!(benches);
