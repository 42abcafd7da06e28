use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use terrain_engine::SurfaceMesh;

/// 地形表面网格标记
#[derive(Component)]
pub struct SlopeSurface;

/// 把引擎生成的顶点数据转换为 Bevy 网格
pub fn build_surface_mesh(surface: SurfaceMesh) -> Mesh {
    // 兼容Bevy 0.12 API
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);

    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, surface.positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, surface.normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, surface.uvs);
    // 顶点颜色区分压雪道和野雪
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, surface.colors);
    mesh.set_indices(Some(Indices::U32(surface.indices)));

    mesh
}
