use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Flat grid the vertex stage displaces. Lies in the XZ plane, centred on the
/// origin, triangles facing +Y.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    pub fn plane(width: f32, depth: f32, segments_x: u32, segments_z: u32) -> Self {
        let (sx, sz) = (segments_x.max(1), segments_z.max(1));
        let mut vertices = Vec::with_capacity(((sx + 1) * (sz + 1)) as usize);
        for j in 0..=sz {
            let v = j as f32 / sz as f32;
            for i in 0..=sx {
                let u = i as f32 / sx as f32;
                vertices.push(Vertex {
                    position: [(u - 0.5) * width, 0.0, (v - 0.5) * depth],
                    uv: [u, v],
                });
            }
        }

        let row = sx + 1;
        let mut indices = Vec::with_capacity((sx * sz * 6) as usize);
        for j in 0..sz {
            for i in 0..sx {
                let a = j * row + i;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }
        Self { vertices, indices }
    }

    pub fn upload(&self, device: &wgpu::Device, label: &str) -> MeshBuffers {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        MeshBuffers {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffers {
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn plane_has_expected_counts_and_extent() {
        let mesh = SurfaceMesh::plane(10.0, 10.0, 100, 100);
        assert_eq!(mesh.vertices.len(), 101 * 101);
        assert_eq!(mesh.indices.len(), 100 * 100 * 6);
        let first = mesh.vertices[0];
        let last = mesh.vertices[mesh.vertices.len() - 1];
        assert_eq!(first.position, [-5.0, 0.0, -5.0]);
        assert_eq!(last.position, [5.0, 0.0, 5.0]);
        assert_eq!((first.uv, last.uv), ([0.0, 0.0], [1.0, 1.0]));
    }

    #[test]
    fn triangles_face_up() {
        let mesh = SurfaceMesh::plane(2.0, 3.0, 3, 2);
        let pos = |i: u32| Vec3::from(mesh.vertices[i as usize].position);
        for tri in mesh.indices.chunks(3) {
            let n = (pos(tri[1]) - pos(tri[0])).cross(pos(tri[2]) - pos(tri[0]));
            assert!(n.y > 0.0);
        }
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }
}
