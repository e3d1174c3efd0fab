//! Trimmed copies of upstream pages used across tests.

pub const LISTING: &str = r#"<!doctype html>
<html><body>
<ul role="list">
  <li x-test-model class="flex items-baseline border-b py-6">
    <a href="/library/llama3.1" class="group w-full">
      <div x-test-model-title title="llama3.1">
        <h2><span x-test-search-response-title>llama3.1</span></h2>
        <p class="max-w-lg break-words text-neutral-800">Llama 3.1 is a new state-of-the-art model from Meta.</p>
      </div>
      <div class="flex flex-wrap space-x-2">
        <span x-test-capability class="rounded-md bg-indigo-50">tools</span>
        <span x-test-size class="rounded-md bg-[#ddf4ff]">8b</span>
        <span x-test-size class="rounded-md bg-[#ddf4ff]">70b</span>
      </div>
      <p class="flex space-x-5">
        <span><span x-test-pull-count>98.5M</span> Pulls</span>
        <span><span x-test-tag-count>93</span> Tags</span>
        <span title="Dec 3, 2024 4:05 PM UTC">Updated <span x-test-updated>6 months ago</span></span>
      </p>
    </a>
  </li>
  <li x-test-model class="flex items-baseline border-b py-6">
    <a href="/jmorganca/codellama" class="group w-full">
      <h2><span x-test-search-response-title>jmorganca/CodeLlama</span></h2>
      <span x-test-capability>Vision</span>
      <span x-test-capability>tools</span>
      <span><span x-test-pull-count>1,234</span> Pulls</span>
      <span>Updated <span x-test-updated>3 days ago</span></span>
    </a>
  </li>
  <li x-test-model><span>no link here</span></li>
</ul>
</body></html>"#;

pub const TAG_PAGE: &str = r#"<!doctype html>
<html><body>
<div class="flex flex-col">
  <h1><a x-test-model-name title="llama3" href="/library/llama3">llama3</a></h1>
  <div id="summary-content"><span>Meta Llama 3: The most capable openly available LLM to date</span></div>
  <div class="flex flex-wrap space-x-2">
    <span class="inline-flex bg-indigo-50 text-indigo-600">Tools</span>
    <span x-test-size class="bg-[#ddf4ff]">8b</span>
    <span x-test-size class="bg-[#ddf4ff]">70b</span>
  </div>
  <p><span x-test-pull-count>7.1M</span> Downloads</p>
  <p><span title="May 2, 2024 3:04 AM UTC">Updated <span x-test-updated>1 year ago</span></span></p>
  <section x-test-model-tag-selection>
    <input class="command" name="command" value="ollama run llama3:8b" readonly>
    <a x-test-tags-link href="/library/llama3/tags">68 Tags</a>
    <div id="tags-nav">
      <a href="/library/llama3:latest" class="group flex px-3 py-2">
        <span class="truncate"><span class="group-hover:underline">latest</span></span>
        <span class="text-xs text-neutral-400">4.7GB</span>
      </a>
      <a href="/library/llama3:8b" class="group flex px-3 py-2 bg-neutral-100">
        <span class="truncate"><span class="group-hover:underline">8B</span></span>
        <span class="text-xs text-neutral-400">4.7GB</span>
      </a>
      <a href="/library/llama3:70b" class="group flex px-3 py-2">
        <span class="truncate"><span class="group-hover:underline">70b</span></span>
        <span class="text-xs text-neutral-400">40GB</span>
      </a>
      <a href="/library/llama3/tags" class="group flex px-3 py-2">View all</a>
    </div>
  </section>
  <div id="file-explorer">
    <section>
      <div class="flex bg-neutral-50 px-4 py-3">
        <p>Updated 11 months ago</p>
        <p>365c0bd3c000 &bull; 4.7GB</p>
      </div>
      <a href="/library/llama3:8b/blobs/6a0746a1ec1a" class="group block grid-cols-12 sm:grid">
        <div class="sm:col-span-2">model</div>
        <div class="sm:col-span-8">arch llama · parameters 8.03B · quantization Q4_0</div>
        <div class="sm:col-start-12">4.7GB</div>
      </a>
      <a href="/library/llama3:8b/blobs/4fa551d4f938" class="group block grid-cols-12 sm:grid">
        <div class="sm:col-span-2">license</div>
        <div class="sm:col-span-8">META LLAMA 3 COMMUNITY LICENSE AGREEMENT</div>
        <div class="sm:col-start-12">12kB</div>
      </a>
      <a href="/library/llama3:8b/blobs/577073ffcc6c" class="group block grid-cols-12 sm:grid">
        <div class="sm:col-span-2">params</div>
        <div class="sm:col-span-8">{"num_keep":24,"stop":["&lt;|eot_id|&gt;"]}</div>
        <div class="sm:col-start-12">110B</div>
      </a>
    </section>
  </div>
  <div id="readme">
    <div id="display"><h2>Model details</h2><p>Llama 3 instruction-tuned models are optimized for dialogue.</p></div>
  </div>
</div>
</body></html>"#;

pub const TAGS_PAGE: &str = r#"<!doctype html>
<html><body>
<ul class="divide-y">
  <li class="group p-3">
    <div class="hidden md:flex">
      <a href="/library/llama3:latest" class="hover:underline">llama3:latest</a>
      <span class="ml-2 text-xs text-blue-600">Default</span>
    </div>
    <a href="/library/llama3:latest" class="md:hidden flex flex-col">
      <span class="group-hover:underline">llama3:latest</span>
      <span><span class="font-mono">365c0bd3c000</span> &bull; 4.7GB &bull; 8K context window &bull; Text input &bull; 1 year ago</span>
    </a>
    <div class="font-mono text-[13px]">365c0bd3c000</div>
  </li>
  <li class="group p-3">
    <div class="hidden md:flex">
      <a href="/library/llama3:70b-instruct-q2_K" class="hover:underline">llama3:70b-instruct-q2_K</a>
    </div>
    <a href="/library/llama3:70b-instruct-q2_K" class="md:hidden flex flex-col">
      <span class="group-hover:underline">llama3:70b-instruct-q2_K</span>
      <span><span class="font-mono">4f4e5ae2cbdc</span> • 26GB • 8K context window • Text input • 11 months ago</span>
    </a>
  </li>
  <li class="group p-3">
    <a href="/library/llama3.1:8b" class="hover:underline">llama3.1:8b</a>
  </li>
</ul>
</body></html>"#;
