//! Starter code for each mode.
//!
//! The first template of a mode is its default: it is loaded into a mode's
//! buffer when that buffer is opened empty.

use shared::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub code: &'static str,
}

const MARKUP: &[Template] = &[
    Template {
        key: "landing",
        name: "Landing Page",
        description: "Landing page with navigation and a hero section",
        code: r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Landing Page</title>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-50 text-gray-800 font-sans">
    <nav class="bg-white shadow-sm">
        <div class="max-w-6xl mx-auto px-6 h-16 flex items-center justify-between">
            <span class="text-2xl font-bold text-indigo-600">Brand</span>
            <div class="space-x-4">
                <a href="#" class="text-gray-600 hover:text-indigo-600">Features</a>
                <a href="#" class="text-gray-600 hover:text-indigo-600">Pricing</a>
                <a href="#" class="bg-indigo-600 text-white px-4 py-2 rounded-md">Get Started</a>
            </div>
        </div>
    </nav>

    <main class="max-w-6xl mx-auto px-6 py-24">
        <h1 class="text-5xl font-extrabold text-gray-900">
            Build something <span class="text-indigo-600">people love</span>
        </h1>
        <p class="mt-6 max-w-xl text-lg text-gray-500">
            A short pitch for the product goes here. Keep it to two sentences.
        </p>
        <div class="mt-8 flex gap-3">
            <a href="#" class="px-8 py-3 rounded-md text-white bg-indigo-600 hover:bg-indigo-700">Get started</a>
            <a href="#" class="px-8 py-3 rounded-md text-indigo-700 bg-indigo-100 hover:bg-indigo-200">Live demo</a>
        </div>
    </main>
</body>
</html>"##,
    },
    Template {
        key: "contact",
        name: "Contact Form",
        description: "Responsive contact form with validation",
        code: r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Contact Form</title>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-100 flex items-center justify-center min-h-screen">
    <form id="contact" class="bg-white p-8 rounded-lg shadow-md w-full max-w-md space-y-4">
        <h2 class="text-2xl font-bold text-gray-800">Contact Us</h2>
        <input class="w-full border rounded py-2 px-3" type="text" placeholder="Your name" required>
        <input class="w-full border rounded py-2 px-3" type="email" placeholder="you@example.com" required>
        <textarea class="w-full border rounded py-2 px-3 h-32" placeholder="Message" required></textarea>
        <button class="w-full bg-blue-600 hover:bg-blue-700 text-white font-bold py-2 rounded" type="submit">Send</button>
    </form>
    <script>
        document.getElementById('contact').addEventListener('submit', (event) => {
            event.preventDefault();
            alert('Message sent!');
        });
    </script>
</body>
</html>"##,
    },
    Template {
        key: "game",
        name: "Canvas Game",
        description: "Move a square with the arrow keys to collect coins",
        code: r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Coin Collector</title>
    <style>
        body { margin: 0; background: #111; display: flex; justify-content: center; align-items: center; height: 100vh; }
        canvas { background: #222; border: 2px solid #444; }
    </style>
</head>
<body>
    <canvas id="game" width="480" height="360"></canvas>
    <script>
        const canvas = document.getElementById('game');
        const ctx = canvas.getContext('2d');
        const player = { x: 220, y: 160, size: 24, speed: 4 };
        const keys = {};
        let coin = spawnCoin();
        let score = 0;

        function spawnCoin() {
            return { x: 20 + Math.random() * 440, y: 20 + Math.random() * 320, r: 8 };
        }

        window.addEventListener('keydown', (e) => { keys[e.key] = true; });
        window.addEventListener('keyup', (e) => { keys[e.key] = false; });

        function update() {
            if (keys.ArrowLeft) player.x -= player.speed;
            if (keys.ArrowRight) player.x += player.speed;
            if (keys.ArrowUp) player.y -= player.speed;
            if (keys.ArrowDown) player.y += player.speed;
            player.x = Math.max(0, Math.min(canvas.width - player.size, player.x));
            player.y = Math.max(0, Math.min(canvas.height - player.size, player.y));

            const dx = player.x + player.size / 2 - coin.x;
            const dy = player.y + player.size / 2 - coin.y;
            if (Math.hypot(dx, dy) < player.size / 2 + coin.r) {
                score += 1;
                coin = spawnCoin();
            }
        }

        function draw() {
            ctx.clearRect(0, 0, canvas.width, canvas.height);
            ctx.fillStyle = '#4ade80';
            ctx.fillRect(player.x, player.y, player.size, player.size);
            ctx.fillStyle = '#facc15';
            ctx.beginPath();
            ctx.arc(coin.x, coin.y, coin.r, 0, Math.PI * 2);
            ctx.fill();
            ctx.fillStyle = '#fff';
            ctx.font = '16px sans-serif';
            ctx.fillText('Score: ' + score, 10, 22);
        }

        function loop() {
            update();
            draw();
            requestAnimationFrame(loop);
        }
        loop();
    </script>
</body>
</html>"##,
    },
];

const SCENE: &[Template] = &[
    Template {
        key: "cube",
        name: "Rotating Cube",
        description: "Lit cube spinning in place",
        code: r##"const geometry = new THREE.BoxGeometry(1.5, 1.5, 1.5);
const material = new THREE.MeshStandardMaterial({ color: 0x6366f1, roughness: 0.4 });
const cube = new THREE.Mesh(geometry, material);
scene.add(cube);

const ambient = new THREE.AmbientLight(0xffffff, 0.4);
scene.add(ambient);
const sun = new THREE.DirectionalLight(0xffffff, 0.8);
sun.position.set(5, 5, 5);
scene.add(sun);

function animate() {
    requestAnimationFrame(animate);
    cube.rotation.x += 0.01;
    cube.rotation.y += 0.01;
    controls.update();
    renderer.render(scene, camera);
}
animate();"##,
    },
    Template {
        key: "particles",
        name: "Particle System",
        description: "5000 drifting particles",
        code: r##"const count = 5000;
const positions = new Float32Array(count * 3);
for (let i = 0; i < count * 3; i++) {
    positions[i] = (Math.random() - 0.5) * 10;
}

const particleGeometry = new THREE.BufferGeometry();
particleGeometry.setAttribute('position', new THREE.BufferAttribute(positions, 3));
const particleMaterial = new THREE.PointsMaterial({ size: 0.03, color: 0x88ccff });
const particles = new THREE.Points(particleGeometry, particleMaterial);
scene.add(particles);

const clock = new THREE.Clock();
function animate() {
    requestAnimationFrame(animate);
    const elapsed = clock.getElapsedTime();
    particles.rotation.y = elapsed * 0.1;
    particles.rotation.x = Math.sin(elapsed * 0.2) * 0.2;
    controls.update();
    renderer.render(scene, camera);
}
animate();"##,
    },
];

const SCRIPT: &[Template] = &[
    Template {
        key: "chart",
        name: "Data Visualization",
        description: "Matplotlib line chart",
        code: r##"import matplotlib.pyplot as plt
import numpy as np

x = np.linspace(0, 10, 100)
y = np.sin(x)
z = np.cos(x)

plt.figure(figsize=(8, 6))
plt.plot(x, y, label='sin(x)', color='blue', linewidth=2)
plt.plot(x, z, label='cos(x)', color='red', linestyle='--', linewidth=2)
plt.title('Sine and Cosine')
plt.xlabel('x')
plt.ylabel('y')
plt.legend()
plt.grid(True)
plt.show()"##,
    },
    Template {
        key: "matrix",
        name: "NumPy Matrix",
        description: "Matrix operations with NumPy",
        code: r##"import numpy as np

A = np.array([[1, 2], [3, 4]])
B = np.array([[5, 6], [7, 8]])

C = np.dot(A, B)
print("A . B =")
print(C)

eigenvalues, eigenvectors = np.linalg.eig(C)
print("Eigenvalues of C:")
print(eigenvalues)"##,
    },
];

pub fn templates_for(mode: Mode) -> &'static [Template] {
    match mode {
        Mode::Markup => MARKUP,
        Mode::Scene => SCENE,
        Mode::Script => SCRIPT,
    }
}

pub fn default_template(mode: Mode) -> &'static Template {
    &templates_for(mode)[0]
}

/// Look up a template by key (or by display name, ignoring case).
pub fn find_template(mode: Mode, key: &str) -> Option<&'static Template> {
    let key = key.trim();
    templates_for(mode)
        .iter()
        .find(|t| t.key.eq_ignore_ascii_case(key) || t.name.eq_ignore_ascii_case(key))
}
